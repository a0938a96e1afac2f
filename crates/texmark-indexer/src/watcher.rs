//! Save events from the file system.
//!
//! Hosts without an editor integration learn about saved files from here
//! and forward each event to [`ProjectIndexer::invalidate`].
//!
//! [`ProjectIndexer::invalidate`]: crate::ProjectIndexer::invalidate

use crate::IndexerError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebouncedEvent, Debouncer, RecommendedCache};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// A file was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEvent {
    pub path: PathBuf,
}

/// Options for the save watcher.
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    /// Debounce duration
    pub debounce_duration: Duration,
    /// Whether to watch recursively
    pub recursive: bool,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(500),
            recursive: true,
        }
    }
}

impl WatcherOptions {
    pub fn with_debounce_ms(ms: u64) -> Self {
        Self {
            debounce_duration: Duration::from_millis(ms),
            ..Default::default()
        }
    }
}

/// Debounced watcher delivering [`SaveEvent`]s.
pub struct SaveWatcher {
    options: WatcherOptions,
    tx: mpsc::Sender<SaveEvent>,
    rx: mpsc::Receiver<SaveEvent>,
    _debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
}

impl SaveWatcher {
    pub fn new(options: WatcherOptions) -> Self {
        let (tx, rx) = mpsc::channel(1000);
        Self {
            options,
            tx,
            rx,
            _debouncer: None,
        }
    }

    /// Start watching a directory.
    pub fn watch(&mut self, path: &Path) -> Result<(), IndexerError> {
        let path = path
            .canonicalize()
            .map_err(|_| IndexerError::NotFound(path.to_path_buf()))?;

        let tx = self.tx.clone();

        let mut debouncer = new_debouncer(
            self.options.debounce_duration,
            None,
            move |result: Result<Vec<DebouncedEvent>, Vec<notify::Error>>| match result {
                Ok(events) => {
                    for event in events {
                        for save in convert_event(&event.event) {
                            if let Err(e) = tx.blocking_send(save) {
                                error!(error = %e, "Failed to send save event");
                            }
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "Watcher error");
                    }
                }
            },
        )
        .map_err(|e| IndexerError::Watcher(e.to_string()))?;

        let mode = if self.options.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        debouncer
            .watch(&path, mode)
            .map_err(|e: notify::Error| IndexerError::Watcher(e.to_string()))?;

        info!(path = ?path, recursive = self.options.recursive, "Started watching");

        self._debouncer = Some(debouncer);

        Ok(())
    }

    /// Receive the next save event.
    pub async fn next(&mut self) -> Option<SaveEvent> {
        self.rx.recv().await
    }

    /// Try to receive a save event without blocking.
    pub fn try_next(&mut self) -> Option<SaveEvent> {
        self.rx.try_recv().ok()
    }
}

/// Save events carried by a notify event. Renames report the new path.
fn convert_event(event: &Event) -> Vec<SaveEvent> {
    let paths: &[PathBuf] = match &event.kind {
        EventKind::Create(_) => &event.paths,
        EventKind::Modify(notify::event::ModifyKind::Name(_)) => {
            event.paths.last().map(std::slice::from_ref).unwrap_or(&[])
        }
        EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => &[],
        EventKind::Modify(_) => &event.paths,
        EventKind::Remove(_) | EventKind::Access(_) | EventKind::Any | EventKind::Other => &[],
    };

    paths
        .iter()
        .filter(|p| !p.is_dir())
        .map(|p| {
            debug!(path = ?p, "File saved");
            SaveEvent { path: p.clone() }
        })
        .collect()
}
