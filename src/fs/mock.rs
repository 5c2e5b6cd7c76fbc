// src/fs/mock.rs

use super::{DirEntry, EntryKind, FileSystem};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File {
        contents: Vec<u8>,
        modified: SystemTime,
    },
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Paths whose listing/stat should fail with the given error kind.
    failures: HashMap<PathBuf, io::ErrorKind>,
}

/// In-memory filesystem for tests.
///
/// Timestamps are explicit: `add_file` uses the Unix epoch, `add_file_at`
/// takes a number of seconds after the epoch. `copy_file` keeps the source's
/// modification time.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

/// Seconds after the Unix epoch as a `SystemTime`.
pub fn mtime(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

fn parent_key(path: &Path) -> Option<&Path> {
    let parent = path.parent()?;
    if parent.as_os_str().is_empty() {
        Some(Path::new("."))
    } else {
        Some(parent)
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState::default();
        // Ensure root exists
        state
            .entries
            .insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert_file(path.as_ref(), content.into(), UNIX_EPOCH);
    }

    pub fn add_file_at(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>, secs: u64) {
        self.insert_file(path.as_ref(), content.into(), mtime(secs));
    }

    /// Create an (empty) directory and all of its ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        Self::ensure_dir_entry(&mut state.entries, path.as_ref());
    }

    /// Remove an entry (and, for directories, nothing else: children become
    /// unreachable). Used to simulate entries that vanish mid-scan.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        state.entries.remove(path);
        if let Some(parent) = parent_key(path) {
            if let Some(MockEntry::Dir(children)) = state.entries.get_mut(parent) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    children.retain(|c| c != name);
                }
            }
        }
    }

    /// Make listing, `kind` or `modified` of `path` fail with `kind`.
    pub fn fail_with(&self, path: impl AsRef<Path>, kind: io::ErrorKind) {
        self.lock()
            .failures
            .insert(path.as_ref().to_path_buf(), kind);
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().entries.get(path.as_ref()) {
            Some(MockEntry::File { contents, .. }) => Some(contents.clone()),
            _ => None,
        }
    }

    fn insert_file(&self, path: &Path, contents: Vec<u8>, modified: SystemTime) {
        let mut state = self.lock();
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File { contents, modified });

        // Ensure parent directories exist implicitly for simplicity in this mock
        if let Some(parent) = parent_key(path) {
            Self::ensure_dir_entry(&mut state.entries, parent);
            Self::link_child(&mut state.entries, parent, path);
        }
    }

    fn link_child(entries: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
        if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
            if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
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
        if let Some(parent) = parent_key(path) {
            if parent != path {
                Self::ensure_dir_entry(entries, parent);
                Self::link_child(entries, parent, path);
            }
        }
    }

    fn check_failure(state: &MockState, path: &Path) -> io::Result<()> {
        match state.failures.get(path) {
            Some(kind) => Err(io::Error::new(*kind, format!("injected failure: {:?}", path))),
            None => Ok(()),
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {:?}", path))
}

impl FileSystem for MockFileSystem {
    fn list_children(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let state = self.lock();
        Self::check_failure(&state, dir)?;
        match state.entries.get(dir) {
            Some(MockEntry::Dir(children)) => Ok(children
                .iter()
                .filter_map(|name| {
                    let path = dir.join(name);
                    let kind = match state.entries.get(&path)? {
                        MockEntry::Dir(_) => EntryKind::Dir,
                        MockEntry::File { .. } => EntryKind::File,
                    };
                    Some(DirEntry { path, kind })
                })
                .collect()),
            Some(MockEntry::File { .. }) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {:?}", dir),
            )),
            None => Err(not_found(dir)),
        }
    }

    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        let state = self.lock();
        Self::check_failure(&state, path)?;
        match state.entries.get(path) {
            Some(MockEntry::Dir(_)) => Ok(EntryKind::Dir),
            Some(MockEntry::File { .. }) => Ok(EntryKind::File),
            None => Err(not_found(path)),
        }
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        let state = self.lock();
        Self::check_failure(&state, path)?;
        match state.entries.get(path) {
            Some(MockEntry::File { modified, .. }) => Ok(*modified),
            Some(MockEntry::Dir(_)) => Ok(UNIX_EPOCH),
            None => Err(not_found(path)),
        }
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let (contents, modified) = {
            let state = self.lock();
            match state.entries.get(from) {
                Some(MockEntry::File { contents, modified }) => (contents.clone(), *modified),
                Some(MockEntry::Dir(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::IsADirectory,
                        format!("is a directory: {:?}", from),
                    ));
                }
                None => return Err(not_found(from)),
            }
        };
        self.insert_file(to, contents, modified);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_create_their_parent_directories() {
        let fs = MockFileSystem::new();
        fs.add_file_at("/proj/src/sub/b.ts", "b", 7);

        assert!(fs.is_dir(Path::new("/proj/src")));
        assert!(fs.is_dir(Path::new("/proj/src/sub")));
        assert_eq!(
            fs.modified(Path::new("/proj/src/sub/b.ts")).unwrap(),
            mtime(7)
        );

        let children = fs.list_children(Path::new("/proj/src")).unwrap();
        assert_eq!(
            children,
            vec![DirEntry {
                path: PathBuf::from("/proj/src/sub"),
                kind: EntryKind::Dir,
            }]
        );
    }

    #[test]
    fn injected_failures_surface_with_their_kind() {
        let fs = MockFileSystem::new();
        fs.add_dir("/locked");
        fs.fail_with("/locked", io::ErrorKind::PermissionDenied);

        let err = fs.list_children(Path::new("/locked")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn copy_keeps_contents_and_mtime() {
        let fs = MockFileSystem::new();
        fs.add_file_at("/src/x.d.ts", "declare", 5);

        fs.copy_file(Path::new("/src/x.d.ts"), Path::new("/out/x.d.ts"))
            .unwrap();

        assert_eq!(fs.contents("/out/x.d.ts").unwrap(), b"declare".to_vec());
        assert_eq!(fs.modified(Path::new("/out/x.d.ts")).unwrap(), mtime(5));
    }
}
