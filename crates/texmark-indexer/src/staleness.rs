//! Per-file staleness decisions.
//!
//! Two signals are reconciled here: the on-disk mtime and the state of an
//! open editor buffer. The decision is a pure function of the recorded
//! [`FileTag`] and a [`FileProbe`] of the file's current state.

use crate::source::{BufferState, ContentSource};
use crate::types::FileTag;
use serde::Serialize;
use std::path::Path;
use std::time::SystemTime;

/// Why a file has to be scanned again. Variants are listed in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    /// No tag recorded for this file in this project
    NewFile,
    /// Disk mtime differs from the recorded one
    MtimeChanged,
    /// An open buffer holds unsaved edits
    BufferModified,
    /// Entries came from a buffer whose tick has moved since
    EditTickChanged,
    /// Entries came from a buffer that is no longer open
    BufferClosed,
}

/// Current state of a file, as seen by the content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileProbe {
    pub mtime: Option<SystemTime>,
    pub buffer: Option<BufferState>,
}

impl FileProbe {
    pub fn of<S: ContentSource + ?Sized>(source: &S, path: &Path) -> Self {
        Self {
            mtime: source.file_mtime(path),
            buffer: source.buffer(path),
        }
    }
}

/// First staleness rule that fires, or `None` if the tag is still valid.
#[must_use]
pub fn assess(tag: Option<&FileTag>, probe: &FileProbe) -> Option<StaleReason> {
    let Some(tag) = tag else {
        return Some(StaleReason::NewFile);
    };

    if tag.mtime != probe.mtime {
        return Some(StaleReason::MtimeChanged);
    }

    match (tag.edit_tick, probe.buffer) {
        (_, Some(buffer)) if buffer.modified => Some(StaleReason::BufferModified),
        (Some(old), Some(buffer)) if buffer.tick != old => Some(StaleReason::EditTickChanged),
        (Some(_), None) => Some(StaleReason::BufferClosed),
        _ => None,
    }
}

/// Whether `path` must be re-scanned given the tag from the last refresh.
pub fn is_stale<S: ContentSource + ?Sized>(source: &S, path: &Path, tag: Option<&FileTag>) -> bool {
    assess(tag, &FileProbe::of(source, path)).is_some()
}
