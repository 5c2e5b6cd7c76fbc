// src/scan/mod.rs

//! Recursive directory traversal on top of [`BoundedQueue`](crate::engine::BoundedQueue).
//!
//! Every directory is one "list and recurse" task and every file is one
//! visitor task, so fan-out is bounded by the queue's limit and stack depth
//! does not grow with tree depth.

pub mod walker;

use crate::types::ItemErrorPolicy;

pub use walker::{collect_files, scan_directory_tree};

/// Default number of concurrently in-flight scan tasks.
pub const DEFAULT_CONCURRENCY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Maximum number of list/visit tasks in flight at once (>= 1).
    pub concurrency: usize,
    pub item_errors: ItemErrorPolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            item_errors: ItemErrorPolicy::default(),
        }
    }
}

impl ScanOptions {
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Self::default()
        }
    }
}

/// What a finished scan saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Files handed to the visitor (also the highest sequence number used).
    pub files: u64,
    /// Directories that were listed successfully.
    pub directories: u64,
    /// Tasks (listings or visitor calls) whose failure was swallowed.
    pub failed_tasks: u64,
}
