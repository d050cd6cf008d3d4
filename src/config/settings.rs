//! Application configuration (config.yaml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::content::SortSpec;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub content: ContentConfig,

    /// Free-form site information handed to clients as-is
    pub site: HashMap<String, serde_yaml::Value>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
    /// Reload the index when Markdown files change
    pub watch: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 4000,
            watch: true,
        }
    }
}

/// Content directory and listing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Content root, relative to the base directory unless absolute
    pub dir: String,
    pub debounce_ms: u64,
    pub include_drafts: bool,
    pub page_size: usize,
    pub sort_by: String,
    pub order: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: "content".to_string(),
            debounce_ms: 500,
            include_drafts: false,
            page_size: 10,
            sort_by: "update_time".to_string(),
            order: "desc".to_string(),
        }
    }
}

impl ContentConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Default ordering for listings
    pub fn sort_spec(&self) -> SortSpec {
        SortSpec::from_params(&self.sort_by, &self.order)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{SortKey, SortOrder};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 4000);
        assert!(config.server.watch);
        assert_eq!(config.content.dir, "content");
        assert_eq!(config.content.debounce(), Duration::from_millis(500));
        assert_eq!(config.content.sort_spec(), SortSpec::default());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
server:
  port: 8080
content:
  dir: docs
  sort_by: sort
  order: asc
site:
  title: My Catalog
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.ip, "127.0.0.1");
        assert_eq!(config.content.dir, "docs");
        assert_eq!(config.content.page_size, 10);
        assert_eq!(
            config.content.sort_spec(),
            SortSpec::new(SortKey::Sort, SortOrder::Asc)
        );
        assert_eq!(config.site["title"].as_str(), Some("My Catalog"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Config::load(&dir.path().join("config.yaml")).is_err());
    }
}
