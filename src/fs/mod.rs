// src/fs/mod.rs

//! Narrow filesystem interface used by the scanner, the staleness checker and
//! the build orchestrator.
//!
//! Everything returns `std::io::Result` so callers can tell a vanished entry
//! (`ErrorKind::NotFound`) apart from real failures.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

pub mod mock;

/// Kind of a directory entry. Symlinks are reported as `Other` when listing,
/// so traversal never follows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
    Other,
}

/// One child returned by [`FileSystem::list_children`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Full path (parent joined with the child name).
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    /// Return the direct children of a directory.
    fn list_children(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    /// Kind of the entry at `path`, following symlinks.
    fn kind(&self, path: &Path) -> io::Result<EntryKind>;

    /// Last modification time of `path`.
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    /// Copy a regular file, creating missing parent directories of `to`.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool {
        self.kind(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.kind(path), Ok(EntryKind::Dir))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.kind(path), Ok(EntryKind::File))
    }
}

/// Run a filesystem call on tokio's blocking pool so async tasks suspend
/// instead of stalling a runtime worker.
pub async fn blocking<T, F>(fs: &Arc<dyn FileSystem>, f: F) -> io::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn FileSystem) -> io::Result<T> + Send + 'static,
{
    let fs = Arc::clone(fs);
    tokio::task::spawn_blocking(move || f(fs.as_ref()))
        .await
        .map_err(io::Error::other)?
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

fn kind_of(file_type: fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Dir
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

impl FileSystem for RealFileSystem {
    fn list_children(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // `DirEntry::file_type` does not traverse symlinks.
            let kind = kind_of(entry.file_type()?);
            entries.push(DirEntry {
                path: entry.path(),
                kind,
            });
        }
        Ok(entries)
    }

    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        Ok(kind_of(fs::metadata(path)?.file_type()))
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to)?;
        Ok(())
    }
}
