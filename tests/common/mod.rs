#![allow(dead_code)]

pub use buildscan_test_utils::builders;
pub use buildscan_test_utils::{init_tracing, with_timeout};

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

/// Write `rel` under `root` and set its modification time to `secs` after
/// the Unix epoch. Parent directories are created as needed.
pub fn write_file_at(root: &Path, rel: &str, secs: u64) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, rel).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
    path
}
