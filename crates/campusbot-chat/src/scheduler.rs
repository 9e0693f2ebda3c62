//! Delayed execution of bot replies.
//!
//! The session controller hands each reply to a [`ReplyScheduler`] as a
//! callback plus a fixed delay. [`TokioScheduler`] runs callbacks on a tokio
//! runtime after a real sleep; [`ManualScheduler`] is a virtual clock that
//! only moves when told to, for deterministic tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Callback run once the delay elapses.
pub type ReplyTask = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a scheduled callback, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// Runs a callback once after a delay without blocking the caller.
pub trait ReplyScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: ReplyTask) -> TaskId;

    /// Cancel a callback that has not run yet. Returns `false` if it already
    /// ran, was already cancelled, or is unknown.
    fn cancel(&self, id: TaskId) -> bool;
}

// =============================================================================
// TokioScheduler
// =============================================================================

/// Schedules each callback as its own tokio task sleeping for the delay.
pub struct TokioScheduler {
    runtime: Handle,
    tasks: Arc<Mutex<HashMap<TaskId, JoinHandle<()>>>>,
    next_id: AtomicU64,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of callbacks still waiting to run.
    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ReplyScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ReplyTask) -> TaskId {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let tasks = Arc::clone(&self.tasks);

        // Held across spawn so the task cannot deregister before it is registered.
        let mut registry = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
            task();
        });
        registry.insert(id, handle);
        tracing::debug!(task = id.0, delay_ms = delay.as_millis() as u64, "Reply scheduled");
        id
    }

    fn cancel(&self, id: TaskId) -> bool {
        let handle = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        match handle {
            Some(handle) => {
                handle.abort();
                tracing::debug!(task = id.0, "Reply cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in tasks.values() {
            handle.abort();
        }
    }
}

// =============================================================================
// ManualScheduler
// =============================================================================

struct ManualTask {
    id: TaskId,
    due: Duration,
    task: ReplyTask,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    queue: Vec<ManualTask>,
}

/// Virtual-time scheduler. Nothing runs until [`ManualScheduler::advance`].
///
/// Due callbacks run in due-time order, ties broken by scheduling order.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of callbacks waiting to run.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Move the clock forward by `by`, running every callback that falls due.
    ///
    /// Callbacks run without the scheduler lock held, so they may schedule
    /// further callbacks; those run too if they fall due within the window.
    /// Returns how many callbacks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.lock().now + by;
        let mut ran = 0;

        loop {
            let next = {
                let mut state = self.lock();
                let idx = state
                    .queue
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(idx, _)| idx);
                match idx {
                    Some(idx) => {
                        let task = state.queue.remove(idx);
                        state.now = task.due;
                        Some(task)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };

            match next {
                Some(task) => {
                    (task.task)();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReplyScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: ReplyTask) -> TaskId {
        let mut state = self.lock();
        state.next_id += 1;
        let id = TaskId(state.next_id);
        let due = state.now + delay;
        state.queue.push(ManualTask { id, due, task });
        id
    }

    fn cancel(&self, id: TaskId) -> bool {
        let mut state = self.lock();
        let before = state.queue.len();
        state.queue.retain(|t| t.id != id);
        state.queue.len() != before
    }
}
