//! Typed hooks fired at lifecycle transitions.
//!
//! Hooks replace dynamically dispatched script callbacks with plain Rust
//! closures. All of them are optional; an absent hook means the default
//! behavior (for close, "not handled").

use std::fmt;
use std::sync::Arc;

type Hook = Arc<dyn Fn() + Send + Sync>;
type VetoHook = Arc<dyn Fn() -> bool + Send + Sync>;

/// Closures invoked by the controller at state transitions.
///
/// The close hook may veto shutdown by returning `true` ("handled"); the
/// others are notifications. Hooks run on the thread that triggered the
/// transition and may call back into the application handle.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub(crate) on_close: Option<VetoHook>,
    pub(crate) on_exit: Option<Hook>,
    pub(crate) on_restart: Option<Hook>,
    pub(crate) on_terminate: Option<Hook>,
}

impl LifecycleHooks {
    /// Creates an empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the close hook. Returning `true` marks the request handled and
    /// suppresses the default exit.
    #[must_use]
    pub fn on_close(mut self, hook: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(hook));
        self
    }

    /// Sets the hook fired once when shutdown is first requested.
    #[must_use]
    pub fn on_exit(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_exit = Some(Arc::new(hook));
        self
    }

    /// Sets the hook fired before the process respawns itself.
    #[must_use]
    pub fn on_restart(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_restart = Some(Arc::new(hook));
        self
    }

    /// Sets the hook fired at the start of deinit, before the final drain.
    #[must_use]
    pub fn on_terminate(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_terminate = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("on_close", &self.on_close.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .field("on_restart", &self.on_restart.is_some())
            .field("on_terminate", &self.on_terminate.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn builder_installs_hooks() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);

        let hooks = LifecycleHooks::new()
            .on_close(|| true)
            .on_exit(move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            });

        assert!(hooks.on_close.as_ref().is_some_and(|hook| hook()));
        hooks.on_exit.as_ref().expect("exit hook should be set")();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(hooks.on_restart.is_none());
        assert!(hooks.on_terminate.is_none());
    }
}
