//! Texmark Indexer
//!
//! Incrementally maintained index of anchors (`\label`s) and outline entries
//! (sectioning commands) across a multi-file document project:
//! - File-set resolution from a root file's include directives
//! - Per-file staleness from disk mtimes and editor buffer state
//! - Re-scanning of stale files only, merged with cached results
//! - Targeted invalidation through a file-to-project reverse index
//!
//! ## Example
//!
//! ```no_run
//! use texmark_indexer::{FsSource, IndexerConfig, LatexScanner, ProjectIndexer};
//! use std::path::Path;
//!
//! fn main() -> Result<(), texmark_indexer::IndexerError> {
//!     let config = IndexerConfig::load();
//!     let mut indexer = ProjectIndexer::with_config(FsSource::new(), LatexScanner::new()?, &config)?;
//!
//!     let index = indexer.refresh(Path::new("/papers/thesis/main.tex"));
//!     println!("{} anchors, {} headings", index.anchors.len(), index.outline.len());
//!
//!     // After the host saves a file:
//!     indexer.invalidate(Path::new("/papers/thesis/intro.tex"));
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod indexer;
pub mod merge;
mod metrics;
pub mod query;
pub mod resolver;
pub mod scanner;
pub mod source;
pub mod staleness;
pub mod store;
mod types;
pub mod watcher;

pub use config::{default_config_path, IndexerConfig};
pub use error::IndexerError;
pub use indexer::ProjectIndexer;
pub use metrics::CacheMetrics;
pub use resolver::IncludeResolver;
pub use scanner::{LatexScanner, Scanner};
pub use source::{BufferState, BufferTable, ContentOrigin, ContentSource, FsSource, MemorySource};
pub use staleness::{is_stale, StaleReason};
pub use store::{ProjectCacheEntry, ReverseIndex};
pub use types::{Anchor, FileTag, OutlineEntry, ProjectIndex, RefreshStats, ScanOutput};
pub use watcher::{SaveEvent, SaveWatcher, WatcherOptions};
