//! Serialized dispatch queue with delayed and repeating tasks.
//!
//! Tasks run only inside [`DispatchQueue::poll`], on whatever thread calls
//! it, so everything scheduled on one queue is mutually serialized without
//! per-task locking. Producers on other threads may enqueue concurrently.
//!
//! Each poll pass opens a new generation and runs only tasks inserted during
//! earlier generations. Work enqueued by a running task therefore waits for
//! the next pass, which bounds every pass and keeps one queue from starving
//! the rest of the loop.

use std::collections::BinaryHeap;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::clock::Clock;
use super::task::{ScheduledTask, TaskBody, TaskHandle};

/// Heap adapter ordering tasks by due time, then insertion order.
struct HeapEntry {
    task: ScheduledTask,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest fire time wins,
        // with the lower sequence number first among equal fire times.
        other
            .task
            .fire_at
            .cmp(&self.task.fire_at)
            .then_with(|| other.task.seq.cmp(&self.task.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.task.seq == other.task.seq
    }
}

impl Eq for HeapEntry {}

/// Mutable queue state behind one lock.
struct QueueInner {
    heap: BinaryHeap<HeapEntry>,
    /// Next insertion sequence number. Increases on every insert, including
    /// reschedules, so sequence order always reflects insertion order.
    next_seq: u64,
    /// Current generation; incremented at the start of each poll pass.
    generation: u64,
    shut_down: bool,
}

/// Execution counters, updated outside the queue lock.
#[derive(Default)]
struct QueueCounters {
    executed: AtomicU64,
    cancelled: AtomicU64,
    panicked: AtomicU64,
}

/// Point-in-time queue statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Tasks waiting in the queue, including cancelled tasks not yet reaped.
    pub pending: usize,
    /// Tasks that ran to completion.
    pub executed: u64,
    /// Tasks dropped at execution time because they were cancelled.
    pub cancelled: u64,
    /// Tasks that panicked while running.
    pub panicked: u64,
}

/// A named task queue drained cooperatively by a poll loop.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use runloop::core::{Clock, DispatchQueue};
///
/// let clock = Arc::new(Clock::monotonic());
/// let queue = DispatchQueue::new("general", clock);
///
/// queue.enqueue(|| println!("hello"));
/// queue.poll();
/// ```
pub struct DispatchQueue {
    name: &'static str,
    clock: Arc<Clock>,
    inner: Mutex<QueueInner>,
    counters: QueueCounters,
}

impl DispatchQueue {
    /// Creates an empty queue reading due times from `clock`.
    #[must_use]
    pub fn new(name: &'static str, clock: Arc<Clock>) -> Self {
        Self {
            name,
            clock,
            inner: Mutex::new(QueueInner {
                heap: BinaryHeap::new(),
                next_seq: 0,
                generation: 0,
                shut_down: false,
            }),
            counters: QueueCounters::default(),
        }
    }

    /// Schedules `body` to run on the next poll pass.
    ///
    /// Safe to call from any thread. On a shut-down queue the task is
    /// dropped and a pre-cancelled handle is returned.
    pub fn enqueue<F>(&self, body: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue_after(body, Duration::ZERO)
    }

    /// Schedules `body` to run once the clock reaches now plus `delay`.
    ///
    /// The delay is a floor, not a deadline: a busy loop runs the task on
    /// the first pass at or after its due time.
    pub fn enqueue_after<F>(&self, body: F, delay: Duration) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let mut body = Some(body);
        self.insert(
            Box::new(move || {
                if let Some(body) = body.take() {
                    body();
                }
            }),
            delay,
            None,
        )
    }

    /// Schedules `body` to run every `interval`, first firing one interval
    /// from now.
    ///
    /// Each occurrence is rescheduled relative to the pass that ran it, so a
    /// stalled loop does not replay missed occurrences. A zero interval is
    /// rejected with a pre-cancelled handle.
    pub fn enqueue_repeating<F>(&self, body: F, interval: Duration) -> TaskHandle
    where
        F: FnMut() + Send + 'static,
    {
        if interval.is_zero() {
            tracing::warn!(queue = self.name, "rejected repeating task with zero interval");
            return TaskHandle::cancelled();
        }
        self.insert(Box::new(body), interval, Some(interval))
    }

    fn insert(&self, body: TaskBody, delay: Duration, repeat: Option<Duration>) -> TaskHandle {
        let fire_at = self.clock.now() + delay;
        let mut inner = self.inner.lock();
        if inner.shut_down {
            tracing::debug!(queue = self.name, "enqueue dropped, queue is shut down");
            return TaskHandle::cancelled();
        }
        let handle = TaskHandle::new();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let generation = inner.generation;
        inner.heap.push(HeapEntry {
            task: ScheduledTask {
                seq,
                generation,
                fire_at,
                repeat,
                body,
                handle: handle.clone(),
            },
        });
        handle
    }

    /// Runs every task that is due at the current clock sample and was
    /// enqueued before this pass began. Returns the number executed.
    ///
    /// Task panics are contained: the panicking task is counted and the
    /// pass moves on to the next task.
    pub fn poll(&self) -> usize {
        let now = self.clock.now();
        let pass_gen = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.generation
        };

        let mut executed = 0;
        while let Some(mut task) = self.pop_due(now, pass_gen) {
            if task.handle.is_cancelled() {
                self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(queue = self.name, seq = task.seq, "skipped cancelled task");
                continue;
            }

            let body = &mut task.body;
            if panic::catch_unwind(panic::AssertUnwindSafe(|| body())).is_ok() {
                self.counters.executed.fetch_add(1, Ordering::Relaxed);
                executed += 1;
            } else {
                self.counters.panicked.fetch_add(1, Ordering::Relaxed);
                tracing::error!(queue = self.name, seq = task.seq, "task panicked, queue continues");
            }

            if task.repeat.is_some() {
                self.reschedule(task, now);
            }
        }
        executed
    }

    /// Pops the top task if it is due and from an earlier generation.
    ///
    /// Tasks inserted during this pass carry `fire_at >= now` and a larger
    /// sequence number, so they sort below every still-due older task and a
    /// non-eligible top means no eligible task remains.
    fn pop_due(&self, now: Duration, pass_gen: u64) -> Option<ScheduledTask> {
        let mut inner = self.inner.lock();
        let due = inner
            .heap
            .peek()
            .is_some_and(|entry| entry.task.fire_at <= now && entry.task.generation < pass_gen);
        if due {
            inner.heap.pop().map(|entry| entry.task)
        } else {
            None
        }
    }

    /// Re-inserts a repeating task one interval after the pass that ran it.
    /// Panicking occurrences are rescheduled like any other.
    fn reschedule(&self, mut task: ScheduledTask, now: Duration) {
        if task.handle.is_cancelled() {
            tracing::trace!(queue = self.name, seq = task.seq, "repeating task cancelled");
            return;
        }
        let Some(interval) = task.repeat else {
            return;
        };
        let mut inner = self.inner.lock();
        if inner.shut_down {
            tracing::debug!(
                queue = self.name,
                seq = task.seq,
                "repeating task dropped, queue is shut down"
            );
            return;
        }
        task.fire_at = now + interval;
        task.generation = inner.generation;
        task.seq = inner.next_seq;
        inner.next_seq += 1;
        inner.heap.push(HeapEntry { task });
    }

    /// Stops accepting new work. Idempotent.
    ///
    /// Tasks already in the queue still run when due; repeating tasks are
    /// no longer rescheduled after their next occurrence.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        if inner.shut_down {
            return;
        }
        inner.shut_down = true;
        tracing::debug!(
            queue = self.name,
            pending = inner.heap.len(),
            "queue shut down"
        );
    }

    /// Whether [`DispatchQueue::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().shut_down
    }

    /// The queue name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of tasks waiting, including cancelled tasks not yet reaped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    /// Whether no tasks are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    /// Snapshot of the queue counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.len(),
            executed: self.counters.executed.load(Ordering::Relaxed),
            cancelled: self.counters.cancelled.load(Ordering::Relaxed),
            panicked: self.counters.panicked.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}
