//! Entities stored in the project index.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Per-file bookkeeping recorded at the end of a refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileTag {
    /// On-disk modification time when the file was last checked
    pub mtime: Option<SystemTime>,
    /// Buffer tick the entries were scanned at, `None` for disk reads
    pub edit_tick: Option<u64>,
}

impl FileTag {
    pub fn from_disk(mtime: Option<SystemTime>) -> Self {
        Self {
            mtime,
            edit_tick: None,
        }
    }

    pub fn from_buffer(mtime: Option<SystemTime>, tick: u64) -> Self {
        Self {
            mtime,
            edit_tick: Some(tick),
        }
    }
}

/// A named reference point in a file (a `\label`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    pub name: String,
    pub file: PathBuf,
    /// Byte offset into the file content
    pub offset: usize,
}

/// A structural heading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub title: String,
    /// Nesting level, 0 for `\part`
    pub level: u8,
    pub file: PathBuf,
    pub offset: usize,
}

/// Raw scanner output for one file, before attribution to a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    /// `(name, offset)` pairs in source order
    pub anchors: Vec<(String, usize)>,
    /// `(title, level, offset)` triples in source order
    pub outline: Vec<(String, u8, usize)>,
}

impl ScanOutput {
    /// Attach the scanned file to every entry.
    pub fn attribute(self, file: &Path) -> (Vec<Anchor>, Vec<OutlineEntry>) {
        let anchors = self
            .anchors
            .into_iter()
            .map(|(name, offset)| Anchor {
                name,
                file: file.to_path_buf(),
                offset,
            })
            .collect();
        let outline = self
            .outline
            .into_iter()
            .map(|(title, level, offset)| OutlineEntry {
                title,
                level,
                file: file.to_path_buf(),
                offset,
            })
            .collect();
        (anchors, outline)
    }
}

/// Counters for a single refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStats {
    /// Files in the resolved project
    pub files: usize,
    /// Files handed to the scanner
    pub scanned: usize,
    /// Files served from the previous entry
    pub kept: usize,
    /// Previous entries discarded (re-scanned or removed files)
    pub dropped_entries: usize,
    pub duration_ms: u64,
}

/// Merged anchors and outline of a project, as returned by a refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectIndex {
    pub anchors: Vec<Anchor>,
    pub outline: Vec<OutlineEntry>,
    #[serde(skip)]
    pub stats: RefreshStats,
}
