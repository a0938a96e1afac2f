//! Indexer error types.
//!
//! The cache core itself never fails: unreadable files scan as empty and
//! missing include targets are skipped. These errors cover the edges around
//! it (configuration, pattern compilation, the save watcher).

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur around indexing operations.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Include or scanner pattern failed to compile
    #[error("Invalid pattern: {0}")]
    Pattern(String),

    /// File watcher error
    #[error("Watcher error: {0}")]
    Watcher(String),
}

impl From<serde_yaml::Error> for IndexerError {
    fn from(e: serde_yaml::Error) -> Self {
        IndexerError::Config(e.to_string())
    }
}

impl From<regex::Error> for IndexerError {
    fn from(e: regex::Error) -> Self {
        IndexerError::Pattern(e.to_string())
    }
}
