//! Contracts for the subsystems the application controller drives.
//!
//! The controller owns one implementation of each trait and calls them at
//! fixed points in the lifecycle. Implementations for development and tests
//! live in [`crate::infra`].

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::AppResult;
use crate::runtime::app::AppHandle;

/// Device classes the platform layer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Keyboard-and-pointer device.
    Desktop,
    /// Touch-first device.
    Mobile,
}

/// Operating-system families, as coarse as scripts need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// Windows desktop.
    Windows,
    /// macOS desktop.
    Mac,
    /// Linux and other unix desktops.
    Linux,
    /// Android.
    Android,
    /// Browser via WebAssembly.
    Browser,
    /// Anything else.
    Unknown,
}

impl OsFamily {
    /// Lowercase name used in logs and exposed to scripts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Mac => "mac",
            Self::Linux => "linux",
            Self::Android => "android",
            Self::Browser => "browser",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device classification applied before subsystems initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Device class.
    pub kind: DeviceKind,
    /// Operating-system family.
    pub os: OsFamily,
}

/// Non-blocking network pump.
///
/// [`NetworkPoller::poll`] is called twice per loop iteration, before and
/// after the queues drain, so protocol work scheduled by tasks is flushed
/// within the same iteration.
pub trait NetworkPoller: Send {
    /// Drains readable data into protocol callbacks and flushes pending
    /// writes. Must not block; with no pending I/O this is a cheap no-op.
    fn poll(&mut self);

    /// Releases network resources. Called once, during final termination.
    fn terminate(&mut self);
}

/// Embedded scripting engine.
pub trait ScriptEngine: Send {
    /// Brings the interpreter up. No runtime surface is available yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot start; init aborts.
    fn init(&mut self) -> AppResult<()>;

    /// Exposes the runtime surface (queues, shutdown requests) to scripts.
    /// Called once during application init, after [`ScriptEngine::init`].
    fn attach(&mut self, app: &AppHandle);

    /// Runs a script by name, reporting whether it completed. Script errors
    /// are reported by the engine, not propagated.
    fn safe_run_script(&mut self, name: &str) -> bool;

    /// Runs unload handlers for loaded modules and drops them.
    fn unload_modules(&mut self);

    /// Releases collectable script objects.
    fn collect_garbage(&mut self);

    /// Shuts the interpreter down. Called once, during final termination.
    fn terminate(&mut self);
}

/// Persistent settings store.
pub trait ConfigStore: Send {
    /// Loads persistent settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read; init aborts.
    fn init(&mut self) -> AppResult<()>;

    /// Flushes and closes the store. Called once, during final termination.
    fn terminate(&mut self);
}

/// Locator for scripts, assets, and the running binary.
pub trait ResourceLocator: Send {
    /// Prepares the locator from the program path (argv\[0\]).
    ///
    /// # Errors
    ///
    /// Returns an error if the filesystem layout is unusable; bootstrap aborts.
    fn init(&mut self, argv0: &str) -> AppResult<()>;

    /// Hands off to a sibling executable when one should run instead,
    /// reporting whether it did. On `true` bootstrap stops here.
    fn launch_correct(&mut self, args: &[String]) -> bool;

    /// Locates the directory containing `entry_script` and records it as
    /// the work directory. Returns `false` when no candidate has it.
    fn discover_work_dir(&mut self, entry_script: &str) -> bool;

    /// Encrypts bundled assets. `None` selects the built-in password.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption is unsupported or fails.
    fn run_encryption(&mut self, password: Option<&str>) -> AppResult<()>;

    /// Path of the running binary, used to respawn the process on restart.
    fn binary_path(&self) -> PathBuf;

    /// Releases locator state. Called once, during final termination.
    fn terminate(&mut self);
}

/// Host-platform services.
pub trait PlatformServices: Send {
    /// Normalizes argument encoding in place before any other startup work.
    fn process_args(&mut self, args: &mut Vec<String>);

    /// Overrides the reported device profile.
    fn set_device(&mut self, device: DeviceProfile);

    /// The current device profile.
    fn device(&self) -> DeviceProfile;

    /// The operating-system family of the current device profile.
    fn os_family(&self) -> OsFamily;

    /// Spawns `binary` with `args` as a detached process.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    fn spawn_process(&mut self, binary: &Path, args: &[String]) -> AppResult<()>;
}

/// Manager for routing connections through proxy tunnels.
pub trait ProxyTunnel: Send {
    /// Starts the proxy manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager cannot start; init aborts.
    fn init(&mut self) -> AppResult<()>;

    /// Drops open tunnels. Called once, during final termination.
    fn terminate(&mut self);
}

/// The full set of subsystems handed to the controller at construction.
pub struct Collaborators {
    /// Network pump polled twice per iteration.
    pub network: Box<dyn NetworkPoller>,
    /// Scripting engine.
    pub script: Box<dyn ScriptEngine>,
    /// Persistent settings store.
    pub config_store: Box<dyn ConfigStore>,
    /// Script and asset locator.
    pub resources: Box<dyn ResourceLocator>,
    /// Host-platform services.
    pub platform: Box<dyn PlatformServices>,
    /// Connection proxy manager.
    pub proxy: Box<dyn ProxyTunnel>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("os", &self.platform.os_family())
            .finish_non_exhaustive()
    }
}
