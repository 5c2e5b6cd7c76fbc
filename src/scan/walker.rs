// src/scan/walker.rs

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use tracing::{debug, info, trace, warn};

use crate::engine::BoundedQueue;
use crate::errors::{BuildscanError, Result};
use crate::fs::{self, EntryKind, FileSystem};
use crate::types::ItemErrorPolicy;

use super::{ScanOptions, ScanSummary};

/// State shared by every task of one scan.
struct ScanContext<V> {
    fs: Arc<dyn FileSystem>,
    queue: BoundedQueue,
    visitor: V,
    policy: ItemErrorPolicy,
    /// Last sequence number handed out; the next file gets `seq + 1`.
    seq: AtomicU64,
    directories: AtomicU64,
    /// First listing error that the policy does not tolerate.
    first_error: Mutex<Option<BuildscanError>>,
}

/// Walk every root breadth-first with bounded fan-out, calling `visitor` once
/// per regular file with the file's path and a 1-based sequence number.
///
/// - All roots are checked before any work starts: a missing root fails with
///   `NotFound`, a root that is not a directory with `InvalidArgument`, and in
///   both cases nothing is scanned.
/// - Sequence numbers are unique and cover `1..=files` across the whole scan;
///   their order across concurrent branches does not follow path order.
/// - Visitor errors are swallowed and counted in `failed_tasks`.
/// - Listing errors follow `options.item_errors`.
/// - Symlinks are not followed.
///
/// Returns once every file (including those in directories discovered while
/// the scan was running) has been visited.
pub async fn scan_directory_tree<V, Fut>(
    fs: Arc<dyn FileSystem>,
    roots: &[PathBuf],
    options: &ScanOptions,
    visitor: V,
) -> Result<ScanSummary>
where
    V: Fn(PathBuf, u64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    if roots.is_empty() {
        return Err(BuildscanError::InvalidArgument(
            "at least one root directory is required".to_string(),
        ));
    }

    let queue = BoundedQueue::new(options.concurrency)?;

    for root in roots {
        ensure_root_dir(&fs, root).await?;
    }

    let ctx = Arc::new(ScanContext {
        fs,
        queue: queue.clone(),
        visitor,
        policy: options.item_errors,
        seq: AtomicU64::new(0),
        directories: AtomicU64::new(0),
        first_error: Mutex::new(None),
    });

    debug!(
        roots = roots.len(),
        concurrency = queue.limit(),
        policy = ?options.item_errors,
        "starting directory scan"
    );

    for root in roots {
        ctx.submit_dir(root.clone())?;
    }

    let stats = queue.wait().await;

    let summary = ScanSummary {
        files: ctx.seq.load(Ordering::SeqCst),
        directories: ctx.directories.load(Ordering::SeqCst),
        failed_tasks: stats.unsuccessful(),
    };

    let first_error = ctx
        .first_error
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(err) = first_error {
        warn!(?summary, "scan finished with an unrecoverable item error");
        return Err(err);
    }

    info!(
        files = summary.files,
        directories = summary.directories,
        failed_tasks = summary.failed_tasks,
        "directory scan complete"
    );
    Ok(summary)
}

/// Scan a single root and return every regular file found, sorted.
pub async fn collect_files(
    fs: Arc<dyn FileSystem>,
    root: &Path,
    options: &ScanOptions,
) -> Result<Vec<PathBuf>> {
    let found = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&found);

    scan_directory_tree(fs, &[root.to_path_buf()], options, move |path, _seq| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(path);
            Ok(())
        }
    })
    .await?;

    let mut files = std::mem::take(&mut *found.lock().unwrap_or_else(PoisonError::into_inner));
    files.sort();
    Ok(files)
}

async fn ensure_root_dir(fs: &Arc<dyn FileSystem>, root: &Path) -> Result<()> {
    let path = root.to_path_buf();
    match fs::blocking(fs, move |fs| fs.kind(&path)).await {
        Ok(EntryKind::Dir) => Ok(()),
        Ok(kind) => Err(BuildscanError::InvalidArgument(format!(
            "scan root {} is not a directory ({kind:?})",
            root.display()
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(BuildscanError::NotFound(root.to_path_buf()))
        }
        Err(err) => Err(BuildscanError::io(root, err)),
    }
}

impl<V, Fut> ScanContext<V>
where
    V: Fn(PathBuf, u64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn submit_dir(self: &Arc<Self>, dir: PathBuf) -> Result<()> {
        let ctx = Arc::clone(self);
        self.queue.submit(async move { ctx.list_dir(dir).await })
    }

    fn submit_visit(self: &Arc<Self>, path: PathBuf) -> Result<()> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(path = %path.display(), seq, "file discovered");

        let ctx = Arc::clone(self);
        self.queue
            .submit(async move { (ctx.visitor)(path, seq).await })
    }

    async fn list_dir(self: Arc<Self>, dir: PathBuf) -> anyhow::Result<()> {
        let target = dir.clone();
        let children = match fs::blocking(&self.fs, move |fs| fs.list_children(&target)).await {
            Ok(children) => children,
            Err(err) => return self.item_error(&dir, err),
        };

        self.directories.fetch_add(1, Ordering::SeqCst);
        trace!(dir = %dir.display(), children = children.len(), "directory listed");

        for child in children {
            match child.kind {
                EntryKind::Dir => self.submit_dir(child.path)?,
                EntryKind::File => self.submit_visit(child.path)?,
                EntryKind::Other => {
                    trace!(path = %child.path.display(), "skipping non-regular entry");
                }
            }
        }

        Ok(())
    }

    /// Apply the item error policy to a failed listing.
    fn item_error(&self, dir: &Path, err: io::Error) -> anyhow::Result<()> {
        if err.kind() == io::ErrorKind::NotFound {
            debug!(dir = %dir.display(), "directory vanished before it was listed");
            return Ok(());
        }

        match self.policy {
            ItemErrorPolicy::Ignore => {
                warn!(dir = %dir.display(), error = %err, "ignoring unreadable directory");
            }
            ItemErrorPolicy::IgnoreVanished => {
                let mut slot = self
                    .first_error
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if slot.is_none() {
                    *slot = Some(BuildscanError::io(dir, io::Error::new(err.kind(), err.to_string())));
                }
            }
        }

        Err(anyhow!(err).context(format!("listing directory {}", dir.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[tokio::test]
    async fn collect_files_returns_sorted_paths() {
        let fs = MockFileSystem::new();
        fs.add_file("/r/b.ts", "b");
        fs.add_file("/r/a/z.ts", "z");
        fs.add_file("/r/a.ts", "a");

        let files = collect_files(Arc::new(fs), Path::new("/r"), &ScanOptions::default())
            .await
            .unwrap();

        assert_eq!(
            files,
            vec![
                PathBuf::from("/r/a.ts"),
                PathBuf::from("/r/a/z.ts"),
                PathBuf::from("/r/b.ts"),
            ]
        );
    }

    #[tokio::test]
    async fn no_roots_is_invalid() {
        let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());
        let err = scan_directory_tree(fs, &[], &ScanOptions::default(), |_, _| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, BuildscanError::InvalidArgument(_)));
    }
}
