//! Worker-thread pool for work that must never block the poll loop.
//!
//! Jobs run on detached worker threads; results come back to the loop by
//! enqueueing a reply task on a dispatch queue. Workers outlive individual
//! job panics.

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::error::DispatchError;
use super::queue::DispatchQueue;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of background worker threads.
pub struct BackgroundPool {
    job_tx: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl BackgroundPool {
    /// Spawns `worker_count` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::WorkerSpawn`] if the OS refuses a thread.
    pub fn new(worker_count: usize) -> Result<Self, DispatchError> {
        let worker_count = worker_count.max(1);
        let (job_tx, job_rx) = unbounded::<Job>();

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let job_rx = job_rx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("bg-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, &job_rx))?;
            workers.push(handle);
        }

        info!(worker_count, "background pool started");
        Ok(Self {
            job_tx: Mutex::new(Some(job_tx)),
            workers: Mutex::new(workers),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Hands `job` to an idle worker.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PoolShutDown`] after [`BackgroundPool::shutdown`].
    pub fn spawn<F>(&self, job: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.job_tx.lock();
        let Some(job_tx) = guard.as_ref() else {
            return Err(DispatchError::PoolShutDown);
        };
        job_tx
            .send(Box::new(job))
            .map_err(|_| DispatchError::PoolShutDown)
    }

    /// Runs `job` on a worker and delivers its output to `reply` as a task
    /// on `queue`, keeping the result on the loop thread.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PoolShutDown`] after [`BackgroundPool::shutdown`].
    pub fn spawn_with_reply<T, F, R>(
        &self,
        queue: &Arc<DispatchQueue>,
        job: F,
        reply: R,
    ) -> Result<(), DispatchError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        R: FnOnce(T) + Send + 'static,
    {
        let queue = Arc::clone(queue);
        self.spawn(move || {
            let output = job();
            queue.enqueue(move || reply(output));
        })
    }

    /// Closes the job channel and joins every worker. Idempotent.
    ///
    /// Jobs already accepted still run to completion before workers exit.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            debug!("background pool already shut down");
            return;
        }

        info!("shutting down background pool");
        {
            let mut job_tx = self.job_tx.lock();
            *job_tx = None;
        }

        let mut workers = self.workers.lock();
        for worker in workers.drain(..) {
            if worker.join().is_err() {
                warn!("background worker exited abnormally");
            }
        }
        debug!("background pool shut down");
    }

    /// Whether [`BackgroundPool::shutdown`] has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

impl Drop for BackgroundPool {
    fn drop(&mut self) {
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            // Dropping the sender lets workers drain and exit on their own;
            // joining here could block an unwinding thread.
            let mut job_tx = self.job_tx.lock();
            *job_tx = None;
            debug!("background pool dropped without shutdown, workers detach");
        }
    }
}

fn worker_loop(worker_id: usize, job_rx: &Receiver<Job>) {
    debug!(worker_id, "background worker started");
    while let Ok(job) = job_rx.recv() {
        if panic::catch_unwind(panic::AssertUnwindSafe(job)).is_err() {
            error!(worker_id, "background job panicked");
        }
    }
    debug!(worker_id, "background worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn jobs_run_on_workers() {
        let pool = BackgroundPool::new(2).expect("pool should start");
        let completed = Arc::new(AtomicUsize::new(0));

        for _ in 0..16 {
            let completed = Arc::clone(&completed);
            pool.spawn(move || {
                completed.fetch_add(1, Ordering::SeqCst);
            })
            .expect("spawn should succeed");
        }

        assert!(wait_for(|| completed.load(Ordering::SeqCst) == 16));
        pool.shutdown();
    }

    #[test]
    fn worker_survives_a_panicking_job() {
        let pool = BackgroundPool::new(1).expect("pool should start");
        let completed = Arc::new(AtomicUsize::new(0));

        pool.spawn(|| panic!("boom")).expect("spawn should succeed");
        let completed_clone = Arc::clone(&completed);
        pool.spawn(move || {
            completed_clone.fetch_add(1, Ordering::SeqCst);
        })
        .expect("spawn should succeed");

        assert!(wait_for(|| completed.load(Ordering::SeqCst) == 1));
        pool.shutdown();
    }

    #[test]
    fn shutdown_is_idempotent_and_rejects_new_jobs() {
        let pool = BackgroundPool::new(1).expect("pool should start");
        pool.shutdown();
        pool.shutdown();

        let result = pool.spawn(|| {});
        assert!(matches!(result, Err(DispatchError::PoolShutDown)));
        assert!(pool.is_shut_down());
    }
}
