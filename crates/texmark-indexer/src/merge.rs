//! Refresh planning and merging.
//!
//! Everything here is pure: the indexer gathers probes and scan results at
//! its boundary and hands them in, so the partition and merge steps can be
//! exercised with fabricated inputs.

use crate::staleness::{assess, FileProbe, StaleReason};
use crate::store::ProjectCacheEntry;
use crate::types::{Anchor, FileTag, OutlineEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One project file and the decision taken for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub probe: FileProbe,
    /// `None` when the previous entries are kept
    pub stale: Option<StaleReason>,
}

/// Per-file decisions for one refresh, in project file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshPlan {
    pub files: Vec<PlannedFile>,
}

impl RefreshPlan {
    pub fn kept(&self) -> impl Iterator<Item = &PlannedFile> {
        self.files.iter().filter(|f| f.stale.is_none())
    }

    pub fn stale(&self) -> impl Iterator<Item = &PlannedFile> {
        self.files.iter().filter(|f| f.stale.is_some())
    }

    pub fn stale_count(&self) -> usize {
        self.stale().count()
    }
}

/// Result of scanning one stale file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshScan {
    /// `None` when the file could not be read
    pub tag: Option<FileTag>,
    pub anchors: Vec<Anchor>,
    pub outline: Vec<OutlineEntry>,
}

/// Decide for every project file whether its previous scan can be kept.
pub fn partition<F>(files: &[PathBuf], tags: &HashMap<PathBuf, FileTag>, mut probe: F) -> RefreshPlan
where
    F: FnMut(&Path) -> FileProbe,
{
    let files = files
        .iter()
        .map(|path| {
            let current = probe(path.as_path());
            PlannedFile {
                path: path.clone(),
                stale: assess(tags.get(path), &current),
                probe: current,
            }
        })
        .collect();
    RefreshPlan { files }
}

/// Build the next cache entry from the previous one and the fresh scans.
///
/// Each file contributes either all of its previous entries (kept) or all
/// of its fresh ones (stale), placed in project file order. Previous entries
/// of files no longer in the project are dropped. A stale file without a
/// readable scan contributes nothing and gets no tag, so the next refresh
/// reads it again. Returns the entry and the number of previous anchors and
/// outline entries that were discarded.
pub fn merge(
    previous: &ProjectCacheEntry,
    plan: &RefreshPlan,
    mut fresh: HashMap<PathBuf, FreshScan>,
) -> (ProjectCacheEntry, usize) {
    let mut prev_anchors: HashMap<&Path, Vec<&Anchor>> = HashMap::new();
    for anchor in &previous.anchors {
        prev_anchors.entry(anchor.file.as_path()).or_default().push(anchor);
    }
    let mut prev_outline: HashMap<&Path, Vec<&OutlineEntry>> = HashMap::new();
    for entry in &previous.outline {
        prev_outline.entry(entry.file.as_path()).or_default().push(entry);
    }

    let mut next = ProjectCacheEntry::new();
    let mut retained = 0usize;

    for file in &plan.files {
        match file.stale {
            None => {
                let anchors = prev_anchors.remove(file.path.as_path()).unwrap_or_default();
                let outline = prev_outline.remove(file.path.as_path()).unwrap_or_default();
                retained += anchors.len() + outline.len();
                next.anchors.extend(anchors.into_iter().cloned());
                next.outline.extend(outline.into_iter().cloned());

                let edit_tick = previous.tags.get(&file.path).and_then(|t| t.edit_tick);
                next.tags.insert(
                    file.path.clone(),
                    FileTag {
                        mtime: file.probe.mtime,
                        edit_tick,
                    },
                );
            }
            Some(_) => {
                let Some(scan) = fresh.remove(&file.path) else {
                    continue;
                };
                next.anchors.extend(scan.anchors);
                next.outline.extend(scan.outline);
                if let Some(tag) = scan.tag {
                    next.tags.insert(
                        file.path.clone(),
                        FileTag {
                            mtime: file.probe.mtime,
                            edit_tick: tag.edit_tick,
                        },
                    );
                }
            }
        }
    }

    let dropped = previous.anchors.len() + previous.outline.len() - retained;
    (next, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BufferState;
    use std::time::{Duration, SystemTime};

    fn at(secs: u64) -> Option<SystemTime> {
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn path(name: &str) -> PathBuf {
        PathBuf::from(format!("/doc/{name}.tex"))
    }

    fn anchor(name: &str, file: &str, offset: usize) -> Anchor {
        Anchor {
            name: name.to_string(),
            file: path(file),
            offset,
        }
    }

    fn heading(title: &str, file: &str, offset: usize) -> OutlineEntry {
        OutlineEntry {
            title: title.to_string(),
            level: 2,
            file: path(file),
            offset,
        }
    }

    fn disk_probe(secs: u64) -> FileProbe {
        FileProbe {
            mtime: at(secs),
            buffer: None,
        }
    }

    fn previous() -> ProjectCacheEntry {
        let mut entry = ProjectCacheEntry::new();
        for name in ["main", "a", "b"] {
            entry.tags.insert(path(name), FileTag::from_disk(at(1)));
        }
        entry.anchors = vec![anchor("a1", "a", 5), anchor("a2", "a", 9), anchor("b1", "b", 2)];
        entry.outline = vec![heading("A", "a", 0), heading("B", "b", 0)];
        entry
    }

    #[test]
    fn test_partition_marks_changed_and_new_files() {
        let prev = previous();
        let files = vec![path("main"), path("a"), path("b"), path("c")];
        let plan = partition(&files, &prev.tags, |p| {
            if p == path("a") {
                disk_probe(2)
            } else {
                disk_probe(1)
            }
        });

        let stale: Vec<_> = plan.stale().map(|f| (f.path.clone(), f.stale)).collect();
        assert_eq!(
            stale,
            vec![
                (path("a"), Some(StaleReason::MtimeChanged)),
                (path("c"), Some(StaleReason::NewFile)),
            ]
        );
        assert_eq!(plan.kept().count(), 2);
    }

    #[test]
    fn test_merge_replaces_whole_file() {
        let prev = previous();
        let files = vec![path("main"), path("a"), path("b")];
        let plan = partition(&files, &prev.tags, |p| {
            if p == path("a") {
                disk_probe(2)
            } else {
                disk_probe(1)
            }
        });
        let fresh = HashMap::from([(
            path("a"),
            FreshScan {
                tag: Some(FileTag::from_disk(at(2))),
                anchors: vec![anchor("a3", "a", 7)],
                outline: vec![heading("A2", "a", 0)],
            },
        )]);

        let (next, dropped) = merge(&prev, &plan, fresh);

        let names: Vec<_> = next.anchors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a3", "b1"]);
        let titles: Vec<_> = next.outline.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["A2", "B"]);
        assert_eq!(next.tags[&path("a")], FileTag::from_disk(at(2)));
        assert_eq!(dropped, 3);
    }

    #[test]
    fn test_merge_drops_removed_files() {
        let prev = previous();
        let files = vec![path("main"), path("a")];
        let plan = partition(&files, &prev.tags, |_| disk_probe(1));

        let (next, dropped) = merge(&prev, &plan, HashMap::new());

        assert!(next.anchors.iter().all(|a| a.file != path("b")));
        assert!(next.outline.iter().all(|e| e.file != path("b")));
        assert!(!next.tags.contains_key(&path("b")));
        assert_eq!(dropped, 2);
    }

    #[test]
    fn test_merge_keeps_file_order() {
        let prev = previous();
        // "main" changes and now defines an anchor; it must stay first.
        let files = vec![path("main"), path("a"), path("b")];
        let plan = partition(&files, &prev.tags, |p| {
            if p == path("main") {
                disk_probe(3)
            } else {
                disk_probe(1)
            }
        });
        let fresh = HashMap::from([(
            path("main"),
            FreshScan {
                tag: Some(FileTag::from_disk(at(3))),
                anchors: vec![anchor("m1", "main", 1)],
                outline: vec![],
            },
        )]);

        let (next, _) = merge(&prev, &plan, fresh);
        let names: Vec<_> = next.anchors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["m1", "a1", "a2", "b1"]);
    }

    #[test]
    fn test_merge_carries_edit_tick_for_kept_files() {
        let mut prev = previous();
        prev.tags.insert(path("a"), FileTag::from_buffer(at(1), 4));
        let files = vec![path("a")];
        let plan = partition(&files, &prev.tags, |_| FileProbe {
            mtime: at(1),
            buffer: Some(BufferState {
                tick: 4,
                modified: false,
            }),
        });
        assert_eq!(plan.stale_count(), 0);

        let (next, _) = merge(&prev, &plan, HashMap::new());
        assert_eq!(next.tags[&path("a")].edit_tick, Some(4));
    }

    #[test]
    fn test_merge_missing_scan_is_empty() {
        let prev = ProjectCacheEntry::new();
        let files = vec![path("a")];
        let plan = partition(&files, &prev.tags, |_| disk_probe(1));

        let (next, dropped) = merge(&prev, &plan, HashMap::new());
        assert!(next.anchors.is_empty());
        assert!(!next.tags.contains_key(&path("a")));
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_merge_unreadable_file_stays_stale() {
        let prev = previous();
        let files = vec![path("main"), path("a"), path("b")];
        let plan = partition(&files, &prev.tags, |p| {
            if p == path("a") {
                disk_probe(2)
            } else {
                disk_probe(1)
            }
        });
        let fresh = HashMap::from([(
            path("a"),
            FreshScan {
                tag: None,
                anchors: Vec::new(),
                outline: Vec::new(),
            },
        )]);

        let (next, _) = merge(&prev, &plan, fresh);
        let names: Vec<_> = next.anchors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["b1"]);
        assert!(!next.tags.contains_key(&path("a")));

        let again = partition(&files, &next.tags, |_| disk_probe(2));
        let stale: Vec<_> = again.stale().map(|f| (f.path.clone(), f.stale)).collect();
        assert_eq!(stale, vec![(path("a"), Some(StaleReason::NewFile))]);
    }
}
