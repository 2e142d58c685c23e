//! Deferred delivery of process termination signals.
//!
//! Signal handlers only set an atomic flag; the poll loop drains the flag
//! between network polls and queue passes, turning it into a single close
//! task on the general queue. SIGTERM and SIGINT share the flag, so any mix
//! of them folds into one close request.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

#[cfg(unix)]
use signal_hook::consts::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::SigId;

use super::app::AppHandle;

/// Bridge from asynchronous termination requests to the poll loop.
///
/// On unix the bridge registers SIGTERM and SIGINT handlers. On other
/// platforms (and in tests) [`SignalBridge::request_close`] delivers the
/// same request programmatically.
pub struct SignalBridge {
    requested: Arc<AtomicBool>,
    latched: AtomicBool,
    #[cfg(unix)]
    registrations: Vec<SigId>,
}

impl SignalBridge {
    /// Creates a bridge with no handlers installed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            latched: AtomicBool::new(false),
            #[cfg(unix)]
            registrations: Vec::new(),
        }
    }

    /// Installs the signal handlers. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS rejects a handler registration.
    pub fn install(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            if !self.registrations.is_empty() {
                return Ok(());
            }
            let term = signal_hook::flag::register(SIGTERM, Arc::clone(&self.requested))?;
            self.registrations.push(term);
            let int = signal_hook::flag::register(SIGINT, Arc::clone(&self.requested))?;
            self.registrations.push(int);
            debug!("termination signal handlers installed");
        }
        #[cfg(not(unix))]
        debug!("no native signal handlers on this platform");
        Ok(())
    }

    /// Requests a close as if a termination signal had arrived.
    ///
    /// This is the delivery point for platforms without POSIX signals and
    /// for embedders wiring their own quit events.
    pub fn request_close(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Turns a pending termination request into one close task on the
    /// general queue. Later requests are ignored once the first is latched
    /// or shutdown is already in progress.
    pub fn drain(&self, app: &AppHandle) {
        if !self.requested.load(Ordering::Acquire) {
            return;
        }
        if self.latched.swap(true, Ordering::AcqRel) {
            return;
        }
        if app.is_stopping() {
            debug!("termination request ignored, shutdown already in progress");
            return;
        }
        info!("termination signal received, scheduling close");
        let target = app.clone();
        app.general().enqueue(move || target.close());
    }

    /// Removes the installed handlers and clears the latch.
    pub fn reset(&mut self) {
        #[cfg(unix)]
        for registration in self.registrations.drain(..) {
            signal_hook::low_level::unregister(registration);
        }
        self.requested.store(false, Ordering::Release);
        self.latched.store(false, Ordering::Release);
        debug!("signal handlers removed");
    }
}

impl Default for SignalBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        self.reset();
    }
}
