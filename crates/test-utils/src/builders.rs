#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use buildscan::build::BuildOptions;
use buildscan::fs::FileSystem;
use buildscan::fs::mock::MockFileSystem;
use buildscan::scan::ScanOptions;

/// Builder for a `MockFileSystem` tree rooted at some directory.
///
/// ```ignore
/// let tree = MockTreeBuilder::new("/proj/src")
///     .file_at("a.ts", 10)
///     .file_at("sub/b.ts", 10)
///     .dir("empty")
///     .build();
/// ```
pub struct MockTreeBuilder {
    fs: MockFileSystem,
    root: PathBuf,
}

impl MockTreeBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let fs = MockFileSystem::new();
        fs.add_dir(root.as_ref());
        Self {
            fs,
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Continue building on an existing mock filesystem.
    pub fn on(fs: &MockFileSystem, root: impl AsRef<Path>) -> Self {
        fs.add_dir(root.as_ref());
        Self {
            fs: fs.clone(),
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Add a file (relative to the root) with mtime at the Unix epoch.
    pub fn file(self, rel: &str) -> Self {
        self.fs.add_file(self.root.join(rel), rel.as_bytes().to_vec());
        self
    }

    /// Add a file (relative to the root) modified `secs` after the epoch.
    pub fn file_at(self, rel: &str, secs: u64) -> Self {
        self.fs
            .add_file_at(self.root.join(rel), rel.as_bytes().to_vec(), secs);
        self
    }

    pub fn dir(self, rel: &str) -> Self {
        self.fs.add_dir(self.root.join(rel));
        self
    }

    pub fn build(self) -> MockFileSystem {
        self.fs
    }

    /// The tree as a shared trait object, ready for the scanner.
    pub fn build_shared(self) -> Arc<dyn FileSystem> {
        Arc::new(self.fs)
    }
}

/// Builder for `BuildOptions`.
pub struct BuildOptionsBuilder {
    options: BuildOptions,
}

impl BuildOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: BuildOptions::default(),
        }
    }

    pub fn pair(mut self, source: &str, out: &str) -> Self {
        self.options.source.push(PathBuf::from(source));
        self.options.out.push(PathBuf::from(out));
        self
    }

    pub fn source(mut self, source: &str) -> Self {
        self.options.source.push(PathBuf::from(source));
        self
    }

    pub fn out(mut self, out: &str) -> Self {
        self.options.out.push(PathBuf::from(out));
        self
    }

    pub fn exclude(mut self, name: &str) -> Self {
        self.options.exclude.push(name.to_string());
        self
    }

    pub fn verbose(mut self, val: bool) -> Self {
        self.options.verbose = val;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.options.scan = ScanOptions::with_concurrency(concurrency);
        self
    }

    pub fn tsconfig(mut self, path: &str) -> Self {
        self.options.tsconfig = PathBuf::from(path);
        self
    }

    pub fn build(self) -> BuildOptions {
        self.options
    }
}

impl Default for BuildOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
