//! The project indexer: owner of all cached state.
//!
//! One [`ProjectIndexer`] is created by the host at startup and lives until
//! shutdown. Every operation takes `&mut self`, so a refresh reads, scans
//! and publishes its entry without interleaving with other operations.

use crate::config::IndexerConfig;
use crate::merge::{merge, partition, FreshScan};
use crate::metrics::CacheMetrics;
use crate::resolver::{normalize_path, IncludeResolver};
use crate::scanner::Scanner;
use crate::source::{ContentOrigin, ContentSource};
use crate::staleness::FileProbe;
use crate::store::{ProjectCacheEntry, ProjectCacheStore, ReverseIndex};
use crate::types::{FileTag, ProjectIndex, RefreshStats};
use crate::IndexerError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tracing::{debug, info, warn};

/// Incremental anchor/outline index over multi-file projects.
pub struct ProjectIndexer<S, P> {
    source: S,
    scanner: P,
    resolver: IncludeResolver,
    store: ProjectCacheStore,
    reverse: ReverseIndex,
    metrics: CacheMetrics,
}

impl<S: ContentSource, P: Scanner> ProjectIndexer<S, P> {
    /// Create an indexer with empty caches.
    pub fn new(source: S, scanner: P, resolver: IncludeResolver) -> Self {
        Self {
            source,
            scanner,
            resolver,
            store: ProjectCacheStore::new(),
            reverse: ReverseIndex::new(),
            metrics: CacheMetrics::default(),
        }
    }

    /// Create an indexer whose include handling follows `config`.
    pub fn with_config(source: S, scanner: P, config: &IndexerConfig) -> Result<Self, IndexerError> {
        Ok(Self::new(source, scanner, IncludeResolver::from_config(config)?))
    }

    /// Files of the project rooted at `root`, root first.
    pub fn resolve(&self, root: &Path) -> Vec<PathBuf> {
        self.resolver.resolve(&self.source, root)
    }

    /// Bring the cached entry for `root` up to date and return its contents.
    ///
    /// Only files whose previous scan is stale are read and scanned. Nothing
    /// is published to the store or reverse index until the final step.
    pub fn refresh(&mut self, root: &Path) -> ProjectIndex {
        let start = Instant::now();
        let root = normalize_path(root);
        let files = self.resolve(&root);

        let empty = ProjectCacheEntry::new();
        let previous = self.store.get(&root).unwrap_or(&empty);

        let source = &self.source;
        let plan = partition(&files, &previous.tags, |path| FileProbe::of(source, path));

        let mut fresh = HashMap::with_capacity(plan.stale_count());
        for file in plan.stale() {
            debug!(path = ?file.path, reason = ?file.stale, "Re-scanning file");
            fresh.insert(file.path.clone(), self.scan_file(&file.path, file.probe.mtime));
        }

        let (entry, dropped) = merge(previous, &plan, fresh);

        let stats = RefreshStats {
            files: files.len(),
            scanned: plan.stale_count(),
            kept: files.len() - plan.stale_count(),
            dropped_entries: dropped,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let index = ProjectIndex {
            anchors: entry.anchors.clone(),
            outline: entry.outline.clone(),
            stats,
        };

        self.store.insert(root.clone(), entry);
        self.reverse.record_project(&root, &files);
        self.metrics.record_refresh(&stats);

        if stats.scanned > 0 {
            info!(
                root = ?root,
                files = stats.files,
                scanned = stats.scanned,
                anchors = index.anchors.len(),
                outline = index.outline.len(),
                duration_ms = stats.duration_ms,
                "Project refreshed"
            );
        } else {
            debug!(root = ?root, files = stats.files, "Project served from cache");
        }

        index
    }

    /// Read and scan one file. Unreadable files scan as empty and carry no
    /// tag, so they are read again by the next refresh.
    fn scan_file(&self, path: &Path, mtime: Option<SystemTime>) -> FreshScan {
        match self.source.read_content(path) {
            Ok((text, origin)) => {
                let tag = match origin {
                    ContentOrigin::Disk => FileTag::from_disk(mtime),
                    ContentOrigin::LiveBuffer { tick, .. } => FileTag::from_buffer(mtime, tick),
                };
                let (anchors, outline) = self.scanner.scan(&text).attribute(path);
                FreshScan {
                    tag: Some(tag),
                    anchors,
                    outline,
                }
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to read file, indexing as empty");
                FreshScan {
                    tag: None,
                    anchors: Vec::new(),
                    outline: Vec::new(),
                }
            }
        }
    }

    /// Force `file` to be re-scanned by the next refresh of every project
    /// that includes it. Other files' cached entries are untouched.
    ///
    /// Returns the number of projects whose tag for `file` was removed.
    pub fn invalidate(&mut self, file: &Path) -> usize {
        let file = normalize_path(file);
        let roots: Vec<PathBuf> = self.reverse.owners(&file).cloned().collect();

        let mut touched = 0;
        for root in &roots {
            if self.store.forget_file(root, &file) {
                touched += 1;
            }
        }

        self.metrics.record_invalidations(touched);
        debug!(file = ?file, owners = roots.len(), touched, "Invalidated file");
        touched
    }

    /// Drop every cached project and reverse-index membership.
    pub fn reset_all(&mut self) {
        info!(projects = self.store.len(), "Resetting project cache");
        self.store.clear();
        self.reverse.clear();
        self.metrics.record_reset();
    }

    /// Cached entry for a root, as of the last refresh.
    pub fn cached(&self, root: &Path) -> Option<&ProjectCacheEntry> {
        self.store.get(&normalize_path(root))
    }

    /// Roots known to include `file`.
    pub fn owners(&self, file: &Path) -> Vec<PathBuf> {
        self.reverse.owners(&normalize_path(file)).cloned().collect()
    }

    pub fn project_count(&self) -> usize {
        self.store.len()
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the content source, e.g. to mirror buffer edits.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn scanner(&self) -> &P {
        &self.scanner
    }
}
