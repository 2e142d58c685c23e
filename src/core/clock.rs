//! Sampled monotonic clock shared by the dispatch queues.
//!
//! The poll loop samples the time source once per pass and every scheduling
//! decision inside that pass reads the same sample. This keeps due-time
//! comparisons consistent across a pass and makes timing fully scriptable in
//! tests via [`ManualTime`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic time, injectable for tests.
pub trait TimeSource: Send + Sync {
    /// Elapsed time since an arbitrary fixed origin.
    fn monotonic(&self) -> Duration;
}

/// Wall-clock backed source anchored at construction time.
#[derive(Debug)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    /// Creates a source whose origin is the moment of construction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn monotonic(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven source for simulated-time tests.
///
/// Time only moves when [`ManualTime::advance`] is called, so tests can place
/// task due times exactly without sleeping.
#[derive(Debug, Default)]
pub struct ManualTime {
    micros: AtomicU64,
}

impl ManualTime {
    /// Creates a source frozen at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves simulated time forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let micros = u64::try_from(delta.as_micros()).unwrap_or(u64::MAX);
        self.micros.fetch_add(micros, Ordering::Release);
    }
}

impl TimeSource for ManualTime {
    fn monotonic(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::Acquire))
    }
}

/// Cached clock sample with microsecond resolution.
///
/// [`Clock::now`] is stable between [`Clock::update`] calls. The sample is an
/// atomic, so readers on other threads never contend with the poll loop.
pub struct Clock {
    source: Arc<dyn TimeSource>,
    sample_micros: AtomicU64,
}

impl Clock {
    /// Creates a clock over the given source and takes an initial sample.
    #[must_use]
    pub fn new(source: Arc<dyn TimeSource>) -> Self {
        let clock = Self {
            source,
            sample_micros: AtomicU64::new(0),
        };
        clock.update();
        clock
    }

    /// Creates a clock backed by real monotonic time.
    #[must_use]
    pub fn monotonic() -> Self {
        Self::new(Arc::new(MonotonicTime::new()))
    }

    /// Re-samples the time source. Called at the boundaries of a poll pass.
    pub fn update(&self) {
        let micros = u64::try_from(self.source.monotonic().as_micros()).unwrap_or(u64::MAX);
        self.sample_micros.store(micros, Ordering::Release);
    }

    /// The most recent sample.
    #[must_use]
    pub fn now(&self) -> Duration {
        Duration::from_micros(self.sample_micros.load(Ordering::Acquire))
    }

    /// The most recent sample in whole milliseconds.
    #[must_use]
    pub fn now_millis(&self) -> u64 {
        self.sample_micros.load(Ordering::Acquire) / 1_000
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock").field("now", &self.now()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_stable_between_updates() {
        let time = Arc::new(ManualTime::new());
        let clock = Clock::new(Arc::clone(&time) as Arc<dyn TimeSource>);

        time.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::ZERO, "stale sample before update");

        clock.update();
        assert_eq!(clock.now(), Duration::from_millis(250));
        assert_eq!(clock.now_millis(), 250);

        time.advance(Duration::from_millis(5));
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn monotonic_source_never_goes_backwards() {
        let clock = Clock::monotonic();
        let first = clock.now();
        clock.update();
        assert!(clock.now() >= first);
    }
}
