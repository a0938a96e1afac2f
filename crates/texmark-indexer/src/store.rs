//! In-memory project cache and the file-to-project reverse index.

use crate::types::{Anchor, FileTag, OutlineEntry};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cached state of one project, keyed by its root file in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectCacheEntry {
    /// Staleness bookkeeping per project file
    pub tags: HashMap<PathBuf, FileTag>,
    /// Merged anchors, file order then source order
    pub anchors: Vec<Anchor>,
    /// Merged outline, file order then source order
    pub outline: Vec<OutlineEntry>,
}

impl ProjectCacheEntry {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Project cache entries keyed by root file.
#[derive(Debug, Default)]
pub struct ProjectCacheStore {
    entries: HashMap<PathBuf, ProjectCacheEntry>,
}

impl ProjectCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, root: &Path) -> Option<&ProjectCacheEntry> {
        self.entries.get(root)
    }

    /// Replace the entry for a root.
    pub fn insert(&mut self, root: PathBuf, entry: ProjectCacheEntry) {
        self.entries.insert(root, entry);
    }

    /// Drop one file's tag from a project, leaving its entries in place.
    ///
    /// Returns `true` if a tag was removed.
    pub fn forget_file(&mut self, root: &Path, file: &Path) -> bool {
        let removed = self
            .entries
            .get_mut(root)
            .is_some_and(|entry| entry.tags.remove(file).is_some());
        if removed {
            debug!(root = ?root, file = ?file, "Forgot file tag");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps each file to the project roots that include it.
///
/// Memberships are only ever added; a file that leaves a project keeps its
/// stale membership until [`ReverseIndex::clear`].
#[derive(Debug, Default)]
pub struct ReverseIndex {
    owners: HashMap<PathBuf, BTreeSet<PathBuf>>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `root` includes `file`. Returns `true` if it was new.
    pub fn record(&mut self, file: &Path, root: &Path) -> bool {
        self.owners
            .entry(file.to_path_buf())
            .or_default()
            .insert(root.to_path_buf())
    }

    /// Record every file of a project.
    pub fn record_project(&mut self, root: &Path, files: &[PathBuf]) {
        for file in files {
            self.record(file, root);
        }
    }

    /// Roots that include `file`, sorted.
    pub fn owners(&self, file: &Path) -> impl Iterator<Item = &PathBuf> {
        self.owners.get(file).into_iter().flat_map(|set| set.iter())
    }

    pub fn owner_count(&self, file: &Path) -> usize {
        self.owners.get(file).map(|s| s.len()).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.owners.clear();
    }

    /// Number of files with at least one owner.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
