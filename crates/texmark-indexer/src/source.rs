//! Content access for indexed files.
//!
//! A [`ContentSource`] answers "what does this file contain right now" by
//! preferring an open, modified editor buffer over the bytes on disk. The
//! staleness rules only ever look at what it reports, so the indexer can be
//! driven by the real filesystem ([`FsSource`]) or by a fabricated one
//! ([`MemorySource`]).

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Where a piece of content was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOrigin {
    /// Read from the file on disk
    Disk,
    /// Read from an open editor buffer
    LiveBuffer { tick: u64, modified: bool },
}

/// Current state of an open editor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferState {
    /// Advances on every edit
    pub tick: u64,
    /// Buffer differs from what was last saved
    pub modified: bool,
}

/// Provides file content, modification times and buffer state.
pub trait ContentSource {
    /// Read the current content of a file.
    ///
    /// An open modified buffer wins over the disk.
    fn read_content(&self, path: &Path) -> io::Result<(String, ContentOrigin)>;

    /// On-disk modification time, `None` if the file cannot be stat'ed.
    fn file_mtime(&self, path: &Path) -> Option<SystemTime>;

    /// Whether the file exists on disk.
    fn file_exists(&self, path: &Path) -> bool;

    /// State of the open buffer for this file, if any.
    fn buffer(&self, path: &Path) -> Option<BufferState>;
}

#[derive(Debug, Clone)]
struct Buffer {
    text: String,
    tick: u64,
    modified: bool,
}

/// Open editor buffers layered over a disk.
#[derive(Debug, Default)]
pub struct BufferTable {
    buffers: HashMap<PathBuf, Buffer>,
}

impl BufferTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a buffer holding the saved content of a file.
    pub fn open(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let path = path.into();
        debug!(path = ?path, "Buffer opened");
        self.buffers.insert(
            path,
            Buffer {
                text: text.into(),
                tick: 1,
                modified: false,
            },
        );
    }

    /// Replace the buffer text. Returns the new tick.
    pub fn edit(&mut self, path: &Path, text: impl Into<String>) -> Option<u64> {
        let buffer = self.buffers.get_mut(path)?;
        buffer.text = text.into();
        buffer.tick += 1;
        buffer.modified = true;
        Some(buffer.tick)
    }

    /// Mirror the editor's tick and modified flag, e.g. after an undo.
    pub fn set_state(&mut self, path: &Path, text: impl Into<String>, state: BufferState) -> bool {
        match self.buffers.get_mut(path) {
            Some(buffer) => {
                buffer.text = text.into();
                buffer.tick = state.tick;
                buffer.modified = state.modified;
                true
            }
            None => false,
        }
    }

    /// Clear the modified flag. Returns the text that was saved.
    pub fn mark_saved(&mut self, path: &Path) -> Option<String> {
        let buffer = self.buffers.get_mut(path)?;
        buffer.modified = false;
        Some(buffer.text.clone())
    }

    pub fn close(&mut self, path: &Path) -> bool {
        debug!(path = ?path, "Buffer closed");
        self.buffers.remove(path).is_some()
    }

    pub fn state(&self, path: &Path) -> Option<BufferState> {
        self.buffers.get(path).map(|b| BufferState {
            tick: b.tick,
            modified: b.modified,
        })
    }

    /// Text of a modified buffer, with its origin.
    fn live_content(&self, path: &Path) -> Option<(String, ContentOrigin)> {
        self.buffers
            .get(path)
            .filter(|b| b.modified)
            .map(|b| {
                (
                    b.text.clone(),
                    ContentOrigin::LiveBuffer {
                        tick: b.tick,
                        modified: true,
                    },
                )
            })
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

/// The real filesystem with an optional buffer overlay.
#[derive(Debug, Default)]
pub struct FsSource {
    buffers: BufferTable,
}

impl FsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffers(&self) -> &BufferTable {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut BufferTable {
        &mut self.buffers
    }

    /// Write a buffer to disk and mark it saved.
    pub fn save_buffer(&mut self, path: &Path) -> io::Result<()> {
        let text = self
            .buffers
            .mark_saved(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no open buffer"))?;
        std::fs::write(path, text)
    }
}

impl ContentSource for FsSource {
    fn read_content(&self, path: &Path) -> io::Result<(String, ContentOrigin)> {
        if let Some(live) = self.buffers.live_content(path) {
            return Ok(live);
        }
        let text = std::fs::read_to_string(path)?;
        Ok((text, ContentOrigin::Disk))
    }

    fn file_mtime(&self, path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn buffer(&self, path: &Path) -> Option<BufferState> {
        self.buffers.state(path)
    }
}

#[derive(Debug, Clone)]
struct MemFile {
    text: String,
    mtime: SystemTime,
}

/// An in-memory disk with a buffer overlay.
///
/// Every write or touch moves the file's mtime forward by one second of a
/// logical clock, so consecutive writes always produce distinct mtimes.
#[derive(Debug)]
pub struct MemorySource {
    files: HashMap<PathBuf, MemFile>,
    buffers: BufferTable,
    clock: SystemTime,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            buffers: BufferTable::new(),
            clock: SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000),
        }
    }

    fn tick_clock(&mut self) -> SystemTime {
        self.clock += Duration::from_secs(1);
        self.clock
    }

    /// Create or overwrite a file on the in-memory disk.
    pub fn write(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let mtime = self.tick_clock();
        self.files.insert(
            path.into(),
            MemFile {
                text: text.into(),
                mtime,
            },
        );
    }

    /// Bump a file's mtime without changing its content.
    pub fn touch(&mut self, path: &Path) -> bool {
        let mtime = self.tick_clock();
        match self.files.get_mut(path) {
            Some(file) => {
                file.mtime = mtime;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        self.files.remove(path).is_some()
    }

    /// Open a buffer on an existing file, holding its disk content.
    pub fn open_buffer(&mut self, path: &Path) -> bool {
        match self.files.get(path) {
            Some(file) => {
                let text = file.text.clone();
                self.buffers.open(path, text);
                true
            }
            None => false,
        }
    }

    /// Write a buffer to the in-memory disk and mark it saved.
    pub fn save_buffer(&mut self, path: &Path) -> bool {
        match self.buffers.mark_saved(path) {
            Some(text) => {
                self.write(path, text);
                true
            }
            None => false,
        }
    }

    pub fn buffers(&self) -> &BufferTable {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut BufferTable {
        &mut self.buffers
    }
}

impl ContentSource for MemorySource {
    fn read_content(&self, path: &Path) -> io::Result<(String, ContentOrigin)> {
        if let Some(live) = self.buffers.live_content(path) {
            return Ok(live);
        }
        self.files
            .get(path)
            .map(|f| (f.text.clone(), ContentOrigin::Disk))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn file_mtime(&self, path: &Path) -> Option<SystemTime> {
        self.files.get(path).map(|f| f.mtime)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn buffer(&self, path: &Path) -> Option<BufferState> {
        self.buffers.state(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_buffer_edit_advances_tick() {
        let mut table = BufferTable::new();
        let path = PathBuf::from("/doc/a.tex");
        table.open(&path, "one");

        assert_eq!(
            table.state(&path),
            Some(BufferState {
                tick: 1,
                modified: false
            })
        );
        assert_eq!(table.edit(&path, "two"), Some(2));
        assert_eq!(table.edit(&path, "three"), Some(3));
        assert!(table.state(&path).unwrap().modified);
    }

    #[test]
    fn test_edit_unknown_buffer() {
        let mut table = BufferTable::new();
        assert_eq!(table.edit(Path::new("/nope.tex"), "x"), None);
        assert!(!table.close(Path::new("/nope.tex")));
    }

    #[test]
    fn test_unmodified_buffer_reads_from_disk() {
        let mut source = MemorySource::new();
        let path = PathBuf::from("/doc/a.tex");
        source.write(&path, "disk");
        source.open_buffer(&path);

        let (text, origin) = source.read_content(&path).unwrap();
        assert_eq!(text, "disk");
        assert_eq!(origin, ContentOrigin::Disk);
    }

    #[test]
    fn test_modified_buffer_wins() {
        let mut source = MemorySource::new();
        let path = PathBuf::from("/doc/a.tex");
        source.write(&path, "disk");
        source.open_buffer(&path);
        source.buffers_mut().edit(&path, "live");

        let (text, origin) = source.read_content(&path).unwrap();
        assert_eq!(text, "live");
        assert_eq!(
            origin,
            ContentOrigin::LiveBuffer {
                tick: 2,
                modified: true
            }
        );
    }

    #[test]
    fn test_memory_writes_bump_mtime() {
        let mut source = MemorySource::new();
        let path = PathBuf::from("/doc/a.tex");
        source.write(&path, "one");
        let first = source.file_mtime(&path).unwrap();
        source.touch(&path);
        let second = source.file_mtime(&path).unwrap();

        assert!(second > first);
        assert_eq!(source.read_content(&path).unwrap().0, "one");
    }

    #[test]
    fn test_memory_save_buffer() {
        let mut source = MemorySource::new();
        let path = PathBuf::from("/doc/a.tex");
        source.write(&path, "old");
        source.open_buffer(&path);
        source.buffers_mut().edit(&path, "new");
        let before = source.file_mtime(&path).unwrap();

        assert!(source.save_buffer(&path));

        assert!(source.file_mtime(&path).unwrap() > before);
        assert!(!source.buffer(&path).unwrap().modified);
        assert_eq!(
            source.read_content(&path).unwrap(),
            ("new".to_string(), ContentOrigin::Disk)
        );
    }

    #[test]
    fn test_memory_missing_file() {
        let source = MemorySource::new();
        let err = source.read_content(Path::new("/missing.tex")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!source.file_exists(Path::new("/missing.tex")));
        assert_eq!(source.file_mtime(Path::new("/missing.tex")), None);
    }

    #[test]
    fn test_fs_source_reads_disk_and_buffers() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("a.tex");
        std::fs::write(&path, "on disk").unwrap();

        let mut source = FsSource::new();
        assert!(source.file_exists(&path));
        assert!(source.file_mtime(&path).is_some());
        assert_eq!(source.read_content(&path).unwrap().0, "on disk");

        source.buffers_mut().open(&path, "on disk");
        source.buffers_mut().edit(&path, "edited");
        assert_eq!(source.read_content(&path).unwrap().0, "edited");

        source.save_buffer(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "edited");
        assert_eq!(source.read_content(&path).unwrap().1, ContentOrigin::Disk);
    }
}
