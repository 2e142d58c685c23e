//! Scheduled task representation and cancellation handles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Boxed work unit run by a dispatch queue.
pub(crate) type TaskBody = Box<dyn FnMut() + Send>;

/// Shared cancellation flag for a scheduled task.
///
/// Cancellation is advisory: a task already executing finishes, but no later
/// occurrence runs. The flag is checked immediately before each execution.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    /// Creates a live handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a handle that is already cancelled.
    ///
    /// Returned by enqueue paths that reject the task outright, so callers
    /// always receive a handle with consistent semantics.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Marks the task cancelled. Idempotent and safe from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the task has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A unit of work waiting in a dispatch queue.
///
/// Ordering inside the queue is by `fire_at`, then by `seq` for first-in
/// first-out among tasks due at the same instant. `generation` records the
/// poll pass during which the task was inserted; a pass only runs tasks from
/// earlier generations.
pub(crate) struct ScheduledTask {
    /// Globally increasing insertion sequence within one queue.
    pub(crate) seq: u64,
    /// Queue generation at insertion time.
    pub(crate) generation: u64,
    /// Clock time at or after which the task may run.
    pub(crate) fire_at: Duration,
    /// Reschedule interval for repeating tasks.
    pub(crate) repeat: Option<Duration>,
    /// The work itself.
    pub(crate) body: TaskBody,
    /// Cancellation flag shared with the caller.
    pub(crate) handle: TaskHandle,
}
