// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { contents: Vec<u8>, modified: u64 },
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Logical clock; every write or touch advances it by one second.
    clock: u64,
}

/// In-memory filesystem with a logical clock for modification times.
///
/// Paths are normalised (`./a/b` and `a/b` are the same entry) and the root
/// is `.`.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

fn normalize(path: &Path) -> PathBuf {
    let normal: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if normal.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normal
    }
}

fn parent_of(path: &Path) -> Option<PathBuf> {
    if path == Path::new(".") {
        return None;
    }
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => Some(p.to_path_buf()),
        _ => Some(PathBuf::from(".")),
    }
}

fn to_time(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.lock()
            .entries
            .insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));
        fs
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the filesystem from others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create or overwrite a file, stamping it with the next clock tick.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        let mut state = self.lock();
        state.clock += 1;
        let modified = state.clock;
        if let Some(parent) = parent_of(&path) {
            Self::ensure_dir_entry(&mut state.entries, &parent);
            Self::link_child(&mut state.entries, &parent, &path);
        }
        state.entries.insert(
            path,
            MockEntry::File {
                contents: content.into(),
                modified,
            },
        );
    }

    /// Advance the clock and bump the file's modification time.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let mut state = self.lock();
        state.clock += 1;
        let now = state.clock;
        if let Some(MockEntry::File { modified, .. }) = state.entries.get_mut(&path) {
            *modified = now;
            return;
        }
        drop(state);
        self.add_file(&path, Vec::new());
    }

    /// Remove a file (no-op for missing paths).
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let mut state = self.lock();
        if state.entries.remove(&path).is_none() {
            return;
        }
        if let Some(parent) = parent_of(&path) {
            if let Some(MockEntry::Dir(children)) = state.entries.get_mut(&parent) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    children.retain(|c| c != name);
                }
            }
        }
    }

    /// Current value of the logical clock.
    pub fn now(&self) -> SystemTime {
        to_time(self.lock().clock)
    }

    fn link_child(entries: &mut HashMap<PathBuf, MockEntry>, parent: &Path, path: &Path) {
        if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }

    fn ensure_dir_entry(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if entries.contains_key(path) {
            return;
        }
        entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = parent_of(path) {
            Self::ensure_dir_entry(entries, &parent);
            Self::link_child(entries, &parent, path);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let state = self.lock();
        match state.entries.get(&normalize(path)) {
            Some(MockEntry::File { contents, .. }) => {
                String::from_utf8(contents.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let contents = {
            let state = self.lock();
            match state.entries.get(&normalize(from)) {
                Some(MockEntry::File { contents, .. }) => contents.clone(),
                _ => return Err(anyhow!("File not found: {:?}", from)),
            }
        };
        self.add_file(to, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = normalize(path);
        let mut state = self.lock();
        if let Some(MockEntry::File { .. }) = state.entries.get(&path) {
            return Err(anyhow!("Not a directory: {:?}", path));
        }
        Self::ensure_dir_entry(&mut state.entries, &path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(&normalize(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(
            self.lock().entries.get(&normalize(path)),
            Some(MockEntry::File { .. })
        )
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.lock().entries.get(&normalize(path)),
            Some(MockEntry::Dir(_))
        )
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        match self.lock().entries.get(&normalize(path))? {
            MockEntry::File { modified, .. } => Some(to_time(*modified)),
            MockEntry::Dir(_) => Some(UNIX_EPOCH),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        match state.entries.get(&normalize(path)) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
