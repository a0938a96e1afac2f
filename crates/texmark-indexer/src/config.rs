//! Configuration for the indexer.

use crate::IndexerError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Indexer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Commands treated as include directives, without the backslash
    #[serde(default = "default_include_commands")]
    pub include_commands: Vec<String>,

    /// Extension appended to include targets that have none
    #[serde(default = "default_extension")]
    pub default_extension: String,

    /// Debounce window for save events in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_include_commands() -> Vec<String> {
    vec![
        "input".to_string(),
        "include".to_string(),
        "subfile".to_string(),
    ]
}

fn default_extension() -> String {
    "tex".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default location of the user config file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("texmark")
        .join("config.yaml")
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            include_commands: default_include_commands(),
            default_extension: default_extension(),
            debounce_ms: default_debounce_ms(),
            log_level: default_log_level(),
        }
    }
}

impl IndexerConfig {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        let config_path = default_config_path();

        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = ?config_path, error = %e, "Failed to load config file");
                }
            }
        }

        Self::default()
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, IndexerError> {
        if !path.exists() {
            return Err(IndexerError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}
