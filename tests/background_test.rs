//! Integration tests for the background worker pool.
//!
//! These tests validate:
//! 1. Replies landing back on a dispatch queue
//! 2. Jobs completing across multiple workers
//! 3. Shutdown draining accepted jobs and rejecting new ones
//! 4. Drop without shutdown detaching workers instead of blocking

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use runloop::core::{BackgroundPool, Clock, DispatchError, DispatchQueue};

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
fn reply_lands_on_the_dispatch_queue() {
    let clock = Arc::new(Clock::monotonic());
    let queue = Arc::new(DispatchQueue::new("general", Arc::clone(&clock)));
    let pool = BackgroundPool::new(2).expect("pool should start");

    let result = Arc::new(Mutex::new(None));
    let result_clone = Arc::clone(&result);
    pool.spawn_with_reply(&queue, || 6 * 7, move |answer| {
        *result_clone.lock() = Some(answer);
    })
    .expect("spawn should succeed");

    assert!(
        wait_for(|| queue.len() == 1),
        "the reply task should be enqueued by the worker"
    );
    assert!(result.lock().is_none(), "the reply waits for a poll");

    clock.update();
    assert_eq!(queue.poll(), 1);
    assert_eq!(*result.lock(), Some(42));

    pool.shutdown();
}

#[test]
fn jobs_complete_across_workers() {
    let pool = BackgroundPool::new(4).expect("pool should start");
    let completed = Arc::new(AtomicUsize::new(0));

    for _ in 0..64 {
        let completed = Arc::clone(&completed);
        pool.spawn(move || {
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .expect("spawn should succeed");
    }

    assert!(wait_for(|| completed.load(Ordering::SeqCst) == 64));
    pool.shutdown();
}

#[test]
fn shutdown_drains_accepted_jobs_then_rejects() {
    let pool = BackgroundPool::new(1).expect("pool should start");
    let completed = Arc::new(AtomicUsize::new(0));

    for _ in 0..8 {
        let completed = Arc::clone(&completed);
        pool.spawn(move || {
            std::thread::sleep(Duration::from_millis(1));
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .expect("spawn should succeed");
    }

    pool.shutdown();
    assert_eq!(
        completed.load(Ordering::SeqCst),
        8,
        "shutdown joins workers after they drain the queue"
    );

    let queue = Arc::new(DispatchQueue::new(
        "general",
        Arc::new(Clock::monotonic()),
    ));
    assert!(matches!(
        pool.spawn(|| {}),
        Err(DispatchError::PoolShutDown)
    ));
    assert!(matches!(
        pool.spawn_with_reply(&queue, || 1, |_| {}),
        Err(DispatchError::PoolShutDown)
    ));
}

#[test]
fn drop_without_shutdown_detaches_workers() {
    let completed = Arc::new(AtomicUsize::new(0));

    {
        let pool = BackgroundPool::new(1).expect("pool should start");
        let completed = Arc::clone(&completed);
        pool.spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .expect("spawn should succeed");
        // The pool is dropped while the job is still running.
    }

    assert!(
        wait_for(|| completed.load(Ordering::SeqCst) == 1),
        "a detached worker still finishes its job"
    );
}
