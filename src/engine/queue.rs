// src/engine/queue.rs

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio::task::JoinError;
use tracing::{debug, trace, warn};

use crate::errors::{BuildscanError, Result};

use super::{QueueStats, TaskFailure};

/// A unit of work as stored in the pending list.
pub type BoxedTask = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Callback invoked for every swallowed task failure.
pub type FailureHook = Arc<dyn Fn(&TaskFailure) + Send + Sync>;

/// Queue that runs submitted futures with a fixed upper bound on how many are
/// in flight at once.
///
/// Semantics:
/// - `submit` never blocks. If a slot is free the task is spawned right away
///   (never polled inline on the caller's stack); otherwise it waits in a FIFO
///   pending list.
/// - Tasks may submit more tasks while they run. A task counts as running
///   until its future resolves, so work it submits is always accounted for
///   before the queue can become quiescent.
/// - A slot that frees up takes the next pending task *inside the same
///   critical section* that would otherwise decrement `running` and signal
///   quiescence. There is no window in which the queue looks idle while work
///   is being handed over.
/// - Errors and panics are swallowed (see [`TaskFailure`]).
/// - Once a caller of [`BoundedQueue::wait`] observes quiescence the queue is
///   closed and further submissions fail with [`BuildscanError::QueueClosed`].
///
/// Cloning is cheap and yields another handle to the same queue; tasks usually
/// capture a clone so they can submit follow-up work.
///
/// `submit` must be called from within a tokio runtime.
#[derive(Clone)]
pub struct BoundedQueue {
    shared: Arc<Shared>,
}

struct Shared {
    limit: usize,
    state: Mutex<QueueState>,
    idle: Notify,
    on_failure: Option<FailureHook>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<BoxedTask>,
    running: usize,
    /// Bumped every time the queue becomes quiescent.
    idle_epoch: u64,
    /// Number of `wait` calls currently suspended.
    waiters: usize,
    closed: bool,
    stats: QueueStats,
}

impl QueueState {
    fn is_quiescent(&self) -> bool {
        self.running == 0 && self.pending.is_empty()
    }
}

impl fmt::Debug for BoundedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("BoundedQueue")
            .field("limit", &self.shared.limit)
            .field("running", &state.running)
            .field("pending", &state.pending.len())
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

impl BoundedQueue {
    /// Create a queue allowing at most `limit` concurrently running tasks.
    pub fn new(limit: usize) -> Result<Self> {
        Self::build(limit, None)
    }

    /// Like [`BoundedQueue::new`], with a hook that sees every swallowed
    /// failure. The hook runs on the task's slot before the slot is released.
    pub fn with_failure_hook(limit: usize, hook: FailureHook) -> Result<Self> {
        Self::build(limit, Some(hook))
    }

    fn build(limit: usize, on_failure: Option<FailureHook>) -> Result<Self> {
        if limit == 0 {
            return Err(BuildscanError::InvalidArgument(
                "concurrency limit must be >= 1 (got 0)".to_string(),
            ));
        }

        Ok(Self {
            shared: Arc::new(Shared {
                limit,
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
                on_failure,
            }),
        })
    }

    pub fn limit(&self) -> usize {
        self.shared.limit
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Snapshot of the diagnostic counters.
    pub fn stats(&self) -> QueueStats {
        self.shared.lock().stats
    }

    /// Enqueue a task. Starts it immediately if a slot is free.
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let task: BoxedTask = Box::pin(task);

        let start_now = {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(BuildscanError::QueueClosed);
            }

            state.stats.submitted += 1;

            if state.running < self.shared.limit {
                state.running += 1;
                state.stats.peak_running = state.stats.peak_running.max(state.running);
                trace!(running = state.running, "starting task immediately");
                Some(task)
            } else {
                state.pending.push_back(task);
                trace!(
                    pending = state.pending.len(),
                    "all slots busy; task queued"
                );
                None
            }
        };

        if let Some(task) = start_now {
            Shared::spawn_slot(Arc::clone(&self.shared), task);
        }

        Ok(())
    }

    /// Suspend until the queue has been quiescent (nothing pending, nothing
    /// running) at least once after this call was made.
    ///
    /// Returns immediately if the queue is already quiescent. Every waiter
    /// suspended at the time is released by the same quiescence event. The
    /// queue is closed once this returns.
    pub async fn wait(&self) -> QueueStats {
        let notified = {
            let mut state = self.shared.lock();
            if state.is_quiescent() {
                state.closed = true;
                debug!(stats = ?state.stats, "queue already quiescent");
                return state.stats;
            }

            // Created and enabled under the lock: only a quiescence that
            // happens after this point can release us.
            let mut notified = Box::pin(self.shared.idle.notified());
            notified.as_mut().enable();
            state.waiters += 1;
            notified
        };

        let guard = WaiterGuard {
            shared: &self.shared,
        };
        notified.await;
        drop(guard);

        let stats = self.stats();
        debug!(?stats, "queue reached quiescence");
        stats
    }
}

/// Keeps `waiters` accurate even if a `wait` future is dropped early.
struct WaiterGuard<'a> {
    shared: &'a Shared,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.waiters = state.waiters.saturating_sub(1);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drive one slot: run the given task, then keep pulling pending tasks
    /// until there are none left.
    fn spawn_slot(shared: Arc<Shared>, first: BoxedTask) {
        tokio::spawn(async move {
            let mut next = Some(first);

            while let Some(task) = next.take() {
                // Inner spawn isolates panics from the slot driver.
                let failure = match tokio::spawn(task).await {
                    Ok(Ok(())) => None,
                    Ok(Err(err)) => Some(TaskFailure::Error(err)),
                    Err(join_err) => Some(TaskFailure::Panicked(panic_message(join_err))),
                };

                if let Some(failure) = &failure {
                    shared.report(failure);
                }

                next = shared.finish_one(failure.as_ref());
            }
        });
    }

    fn report(&self, failure: &TaskFailure) {
        warn!(%failure, "task failure swallowed by queue");
        if let Some(hook) = &self.on_failure {
            // The slot must still be released if the hook itself panics.
            if panic::catch_unwind(AssertUnwindSafe(|| hook(failure))).is_err() {
                warn!("failure hook panicked");
            }
        }
    }

    /// Account for a finished task. Either hands back the next pending task
    /// (the slot stays occupied) or releases the slot, signalling quiescence
    /// if it was the last one.
    fn finish_one(&self, failure: Option<&TaskFailure>) -> Option<BoxedTask> {
        let mut state = self.lock();

        state.stats.completed += 1;
        match failure {
            Some(TaskFailure::Error(_)) => state.stats.failed += 1,
            Some(TaskFailure::Panicked(_)) => state.stats.panicked += 1,
            None => {}
        }

        if let Some(next) = state.pending.pop_front() {
            trace!(
                pending = state.pending.len(),
                "slot freed; starting next pending task"
            );
            return Some(next);
        }

        state.running -= 1;

        if state.running == 0 {
            state.idle_epoch += 1;
            if state.waiters > 0 {
                state.closed = true;
            }
            debug!(
                epoch = state.idle_epoch,
                waiters = state.waiters,
                "queue became quiescent"
            );
            self.idle.notify_waiters();
        }

        None
    }
}

fn panic_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task was cancelled".to_string();
    }

    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
