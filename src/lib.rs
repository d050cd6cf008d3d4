//! mdnav: serve a directory of Markdown files as a document catalog
//!
//! The core is an in-memory [`index::ContentIndex`] built from a content
//! directory: each directory holding an `_index.md` marker becomes a
//! category, every other Markdown file a document. The index is rebuilt as a
//! whole when files change and swapped in atomically, so concurrent readers
//! always see one consistent generation.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod index;
pub mod server;
pub mod service;
pub mod watcher;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use error::IndexError;
pub use index::{ContentIndex, Snapshot};
pub use service::Catalog;
pub use watcher::ChangeWatcher;

/// Default configuration file name in the base directory
pub const CONFIG_FILE: &str = "config.yaml";

/// The main application
#[derive(Clone)]
pub struct Mdnav {
    /// Configuration
    pub config: config::Config,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content root
    pub content_dir: PathBuf,
}

impl Mdnav {
    /// Create a new instance from a base directory, reading `config.yaml`
    /// there when it exists
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::Config::load(&config_path)?
        } else {
            config::Config::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config: config::Config) -> Self {
        let content_dir = base_dir.join(&config.content.dir);
        Self {
            config,
            base_dir,
            content_dir,
        }
    }

    /// Build the content index from the content root
    pub fn load_index(&self) -> Result<Arc<ContentIndex>> {
        let index = ContentIndex::load(&self.content_dir).with_context(|| {
            format!("Failed to load content from {}", self.content_dir.display())
        })?;
        Ok(Arc::new(index))
    }

    /// Catalog over `index` honoring the draft setting
    pub fn catalog(&self, index: Arc<ContentIndex>) -> Catalog {
        Catalog::new(index).with_drafts(self.config.content.include_drafts)
    }

    /// Watcher for the content root with the configured debounce window
    pub fn watcher(&self) -> ChangeWatcher {
        ChangeWatcher::new(self.content_dir.clone()).with_debounce(self.config.content.debounce())
    }
}
