//! Error types for the content index

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or watching the content index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Content root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
