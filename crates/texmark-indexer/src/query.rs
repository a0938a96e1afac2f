//! Read helpers over a refreshed project index.

use crate::types::{Anchor, OutlineEntry, ProjectIndex};
use std::collections::HashMap;
use std::path::Path;

/// Anything that sits at a byte offset in a file.
pub trait Located {
    fn file(&self) -> &Path;
    fn offset(&self) -> usize;
}

impl Located for Anchor {
    fn file(&self) -> &Path {
        &self.file
    }

    fn offset(&self) -> usize {
        self.offset
    }
}

impl Located for OutlineEntry {
    fn file(&self) -> &Path {
        &self.file
    }

    fn offset(&self) -> usize {
        self.offset
    }
}

/// First anchor with this name, in project file order.
pub fn find_anchor<'a>(index: &'a ProjectIndex, name: &str) -> Option<&'a Anchor> {
    index.anchors.iter().find(|a| a.name == name)
}

/// Anchor names defined more than once, with every definition site.
///
/// Sorted by name; sites keep project order.
pub fn duplicate_anchors(index: &ProjectIndex) -> Vec<(String, Vec<&Anchor>)> {
    let mut by_name: HashMap<&str, Vec<&Anchor>> = HashMap::new();
    for anchor in &index.anchors {
        by_name.entry(anchor.name.as_str()).or_default().push(anchor);
    }

    let mut duplicates: Vec<_> = by_name
        .into_iter()
        .filter(|(_, sites)| sites.len() > 1)
        .map(|(name, sites)| (name.to_string(), sites))
        .collect();
    duplicates.sort_by(|a, b| a.0.cmp(&b.0));
    duplicates
}

/// Reorder entries so the ones at or after a cursor come first.
///
/// `entries` must be in project order. The split point is the first entry
/// in `file` at or past `offset`, or just after the last entry of `file`.
/// If `file` has no entries the order is unchanged.
pub fn order_from_cursor<'a, T: Located>(entries: &'a [T], file: &Path, offset: usize) -> Vec<&'a T> {
    let in_file: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.file() == file)
        .map(|(i, _)| i)
        .collect();

    let Some(&last) = in_file.last() else {
        return entries.iter().collect();
    };
    let split = in_file
        .iter()
        .copied()
        .find(|&i| entries[i].offset() >= offset)
        .unwrap_or(last + 1);

    entries[split..].iter().chain(entries[..split].iter()).collect()
}
