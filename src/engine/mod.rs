// src/engine/mod.rs

//! Concurrency engine for buildscan.
//!
//! [`queue::BoundedQueue`] is a scheduling discipline layered on top of the
//! tokio runtime: it owns no threads, it only decides *when* a submitted
//! future is handed to `tokio::spawn` so that at most `limit` of them are in
//! flight at once.
//!
//! Task failures never escape the queue. They are turned into a
//! [`TaskFailure`], counted in [`QueueStats`], logged, and handed to an
//! optional failure hook.

use std::fmt;

pub mod queue;

pub use queue::{BoundedQueue, BoxedTask, FailureHook};

/// Why a task did not finish successfully.
#[derive(Debug)]
pub enum TaskFailure {
    /// The task returned `Err`.
    Error(anyhow::Error),
    /// The task panicked (or was aborted by runtime shutdown).
    Panicked(String),
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Error(err) => write!(f, "task failed: {err:#}"),
            TaskFailure::Panicked(msg) => write!(f, "task panicked: {msg}"),
        }
    }
}

/// Diagnostic counters for a queue instance.
///
/// None of these take part in completion semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub submitted: u64,
    pub completed: u64,
    /// Tasks that returned `Err`.
    pub failed: u64,
    pub panicked: u64,
    /// Highest number of tasks that were running at the same time.
    pub peak_running: usize,
}

impl QueueStats {
    /// Tasks that finished without success, whatever the reason.
    pub fn unsuccessful(&self) -> u64 {
        self.failed + self.panicked
    }
}
