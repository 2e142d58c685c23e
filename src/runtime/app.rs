//! Application controller: lifecycle state machine and poll loop.
//!
//! The controller owns the clock, the three dispatch queues, the background
//! pool, the signal bridge, and one implementation of each collaborator
//! contract. It advances through `Uninitialized -> Initialized -> Running ->
//! Stopping -> Terminated`; termination is permanent.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::config::{RuntimeConfig, StartupOptions};
use crate::core::{BackgroundPool, Clock, DispatchQueue, StartupError};

use super::collaborators::{Collaborators, DeviceKind, DeviceProfile, OsFamily};
use super::hooks::LifecycleHooks;
use super::signal::SignalBridge;

/// Lifecycle states, in order of progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ApplicationState {
    /// Constructed; subsystems not initialized.
    Uninitialized = 0,
    /// Subsystems initialized; poll loop not entered.
    Initialized = 1,
    /// Poll loop active.
    Running = 2,
    /// Stop requested; the loop is winding down.
    Stopping = 3,
    /// Everything released. Permanent.
    Terminated = 4,
}

impl ApplicationState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Initialized,
            2 => Self::Running,
            3 => Self::Stopping,
            _ => Self::Terminated,
        }
    }
}

/// State shared between the controller and its handles.
struct AppShared {
    state: AtomicU8,
    clock: Arc<Clock>,
    general: Arc<DispatchQueue>,
    input: Arc<DispatchQueue>,
    render: Arc<DispatchQueue>,
    hooks: Mutex<LifecycleHooks>,
}

impl AppShared {
    fn state(&self) -> ApplicationState {
        ApplicationState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn is_stopping(&self) -> bool {
        self.state() >= ApplicationState::Stopping
    }

    fn is_terminated(&self) -> bool {
        self.state() == ApplicationState::Terminated
    }

    /// Flips the state to `Stopping` and fires the exit hook. The flip is a
    /// compare-and-swap, so concurrent callers fire the hook exactly once.
    fn exit(&self) {
        let flipped = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                (raw < ApplicationState::Stopping as u8)
                    .then_some(ApplicationState::Stopping as u8)
            })
            .is_ok();
        if !flipped {
            debug!("exit request ignored, shutdown already in progress");
            return;
        }
        info!("application stop requested");
        // Hooks are cloned out so they can call back into the handle
        // without holding the hooks lock.
        let hook = self.hooks.lock().on_exit.clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn close(&self) {
        if self.is_stopping() {
            debug!("close request ignored, shutdown already in progress");
            return;
        }
        let hook = self.hooks.lock().on_close.clone();
        let handled = hook.is_some_and(|hook| hook());
        if handled {
            debug!("close request handled by hook");
        } else {
            self.exit();
        }
    }
}

/// Cloneable handle for enqueueing work and requesting shutdown from tasks,
/// background jobs, scripts, and other threads.
#[derive(Clone)]
pub struct AppHandle {
    shared: Arc<AppShared>,
}

impl AppHandle {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ApplicationState {
        self.shared.state()
    }

    /// Whether a stop has been requested (or already completed).
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.shared.is_stopping()
    }

    /// Whether the application has fully terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.shared.is_terminated()
    }

    /// Requests an orderly close. The close hook may handle the request;
    /// otherwise this exits.
    pub fn close(&self) {
        self.shared.close();
    }

    /// Requests an unconditional stop of the poll loop.
    pub fn exit(&self) {
        self.shared.exit();
    }

    /// The general-purpose queue.
    #[must_use]
    pub fn general(&self) -> &Arc<DispatchQueue> {
        &self.shared.general
    }

    /// The input queue.
    #[must_use]
    pub fn input(&self) -> &Arc<DispatchQueue> {
        &self.shared.input
    }

    /// The render-synchronized queue.
    #[must_use]
    pub fn render(&self) -> &Arc<DispatchQueue> {
        &self.shared.render
    }

    /// The shared clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<Clock> {
        &self.shared.clock
    }

    /// Replaces the installed lifecycle hooks.
    pub fn install_hooks(&self, hooks: LifecycleHooks) {
        *self.shared.hooks.lock() = hooks;
    }
}

impl fmt::Debug for AppHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// The application controller.
///
/// Owns the scheduling primitives and collaborator subsystems and drives
/// them through the lifecycle. One instance per process; the embedder calls
/// [`Application::init`], [`Application::run`], [`Application::deinit`], and
/// [`Application::terminate`] in that order (or uses
/// [`crate::runtime::bootstrap`], which does).
pub struct Application {
    shared: Arc<AppShared>,
    collaborators: Collaborators,
    background: BackgroundPool,
    signals: SignalBridge,
    config: RuntimeConfig,
    startup_args: Vec<String>,
}

impl Application {
    /// Builds a controller in the `Uninitialized` state.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::InvalidConfig`] for a bad configuration or
    /// [`StartupError::Subsystem`] if the background pool cannot start.
    pub fn new(
        collaborators: Collaborators,
        config: RuntimeConfig,
        hooks: LifecycleHooks,
    ) -> Result<Self, StartupError> {
        config.validate().map_err(StartupError::InvalidConfig)?;
        let worker_count = config.background_workers.unwrap_or_else(num_cpus::get);
        let background =
            BackgroundPool::new(worker_count).map_err(|e| StartupError::Subsystem(e.into()))?;

        let clock = Arc::new(Clock::monotonic());
        let shared = Arc::new(AppShared {
            state: AtomicU8::new(ApplicationState::Uninitialized as u8),
            general: Arc::new(DispatchQueue::new("general", Arc::clone(&clock))),
            input: Arc::new(DispatchQueue::new("input", Arc::clone(&clock))),
            render: Arc::new(DispatchQueue::new("render", Arc::clone(&clock))),
            clock,
            hooks: Mutex::new(hooks),
        });

        Ok(Self {
            shared,
            collaborators,
            background,
            signals: SignalBridge::new(),
            config,
            startup_args: Vec::new(),
        })
    }

    /// Crate version, exposed to scripts and logs.
    #[must_use]
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Initializes signal handling and the collaborator subsystems.
    ///
    /// A `-mobile` startup token switches the platform to the mobile device
    /// profile before any subsystem comes up.
    ///
    /// # Errors
    ///
    /// Fails on repeat initialization, on a terminated instance, or when a
    /// subsystem refuses to start.
    pub fn init(&mut self, options: &StartupOptions) -> Result<(), StartupError> {
        match self.shared.state() {
            ApplicationState::Uninitialized => {}
            ApplicationState::Terminated => return Err(StartupError::Terminated),
            _ => return Err(StartupError::AlreadyInitialized),
        }

        self.signals
            .install()
            .map_err(|e| StartupError::Subsystem(e.into()))?;

        let joined = options.joined();
        if !joined.is_empty() {
            info!(options = %joined, "startup options");
        }
        self.startup_args = options.args.clone();

        if options.mobile() {
            self.collaborators.platform.set_device(DeviceProfile {
                kind: DeviceKind::Mobile,
                os: OsFamily::Android,
            });
        }

        self.collaborators
            .config_store
            .init()
            .map_err(StartupError::Subsystem)?;
        self.collaborators
            .script
            .init()
            .map_err(StartupError::Subsystem)?;
        let handle = self.handle();
        self.collaborators.script.attach(&handle);
        self.collaborators
            .proxy
            .init()
            .map_err(StartupError::Subsystem)?;

        self.shared
            .state
            .store(ApplicationState::Initialized as u8, Ordering::Release);
        info!(os = %self.collaborators.platform.os_family(), "application initialized");
        Ok(())
    }

    /// Runs one scheduling iteration.
    ///
    /// The pass order is fixed: sample the clock, pump the network, drain
    /// pending termination signals, drain the input queue, drain the general
    /// queue, pump the network again so protocol messages produced by tasks
    /// leave in the same iteration, then re-sample the clock.
    pub fn poll(&mut self) {
        if self.shared.is_terminated() {
            return;
        }
        self.shared.clock.update();
        self.collaborators.network.poll();
        let handle = self.handle();
        self.signals.drain(&handle);
        self.shared.input.poll();
        self.shared.general.poll();
        self.collaborators.network.poll();
        self.shared.clock.update();
    }

    /// Runs the poll loop until a stop is requested.
    ///
    /// Each iteration is one [`Application::poll`] pass, one render-queue
    /// pass, and the configured pacing sleep. Calling `run` on anything but
    /// an `Initialized` instance is a logged no-op.
    pub fn run(&mut self) {
        let entered = self
            .shared
            .state
            .compare_exchange(
                ApplicationState::Initialized as u8,
                ApplicationState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if !entered {
            debug!(state = ?self.shared.state(), "run skipped, application not initialized");
            return;
        }

        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            "entering poll loop"
        );
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        while !self.shared.is_stopping() {
            self.poll();
            self.shared.render.poll();
            if !interval.is_zero() {
                thread::sleep(interval);
            }
        }
        info!("poll loop stopped");
    }

    /// Requests an orderly close. See [`AppHandle::close`].
    pub fn close(&self) {
        self.shared.close();
    }

    /// Requests an unconditional stop. See [`AppHandle::exit`].
    pub fn exit(&self) {
        self.shared.exit();
    }

    /// Delivers a termination request as if a signal had arrived. The next
    /// poll pass turns it into a close task.
    pub fn request_close(&self) {
        self.signals.request_close();
    }

    /// Respawns the process with the original arguments, then exits.
    ///
    /// The restart hook fires before the spawn. Ignored once shutdown is in
    /// progress, so repeated calls spawn at most one replacement.
    pub fn restart(&mut self) {
        if self.shared.is_stopping() {
            debug!("restart ignored, shutdown already in progress");
            return;
        }
        let hook = self.shared.hooks.lock().on_restart.clone();
        if let Some(hook) = hook {
            hook();
        }
        let binary = self.collaborators.resources.binary_path();
        info!(binary = %binary.display(), "respawning process before exit");
        if let Err(err) = self
            .collaborators
            .platform
            .spawn_process(&binary, &self.startup_args)
        {
            error!(error = %err, "failed to respawn process");
        }
        self.exit();
    }

    /// Winds down scheduling: fires the terminate hook, performs one final
    /// drain of all three queues, shuts them down, and unloads script
    /// modules. Call after [`Application::run`] returns.
    pub fn deinit(&mut self) {
        if self.shared.is_terminated() {
            debug!("deinit skipped, application already terminated");
            return;
        }
        info!("deinitializing application");
        let hook = self.shared.hooks.lock().on_terminate.clone();
        if let Some(hook) = hook {
            hook();
        }

        // Final drain: work scheduled by the terminate hook still runs,
        // then the queues stop accepting tasks.
        self.poll();
        self.shared.render.poll();
        self.shared.input.shutdown();
        self.shared.general.shutdown();
        self.shared.render.shutdown();

        self.collaborators.script.unload_modules();
        self.collaborators.script.collect_garbage();
    }

    /// Releases every subsystem and enters the permanent `Terminated` state.
    /// Idempotent; subsequent lifecycle calls become no-ops.
    pub fn terminate(&mut self) {
        if self.shared.is_terminated() {
            debug!("terminate skipped, application already terminated");
            return;
        }
        self.collaborators.network.terminate();
        self.collaborators.config_store.terminate();
        self.collaborators.resources.terminate();
        self.collaborators.script.terminate();
        self.collaborators.proxy.terminate();
        self.background.shutdown();
        self.shared
            .state
            .store(ApplicationState::Terminated as u8, Ordering::Release);
        self.signals.reset();
        info!("application terminated");
    }

    /// Runs a script by name through the engine, reporting success.
    pub fn run_script(&mut self, name: &str) -> bool {
        self.collaborators.script.safe_run_script(name)
    }

    /// A cloneable handle onto this application.
    #[must_use]
    pub fn handle(&self) -> AppHandle {
        AppHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ApplicationState {
        self.shared.state()
    }

    /// Whether a stop has been requested (or already completed).
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.shared.is_stopping()
    }

    /// Whether the application has fully terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.shared.is_terminated()
    }

    /// The general-purpose queue.
    #[must_use]
    pub fn general(&self) -> &Arc<DispatchQueue> {
        &self.shared.general
    }

    /// The input queue.
    #[must_use]
    pub fn input(&self) -> &Arc<DispatchQueue> {
        &self.shared.input
    }

    /// The render-synchronized queue.
    #[must_use]
    pub fn render(&self) -> &Arc<DispatchQueue> {
        &self.shared.render
    }

    /// The background worker pool.
    #[must_use]
    pub fn background(&self) -> &BackgroundPool {
        &self.background
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
