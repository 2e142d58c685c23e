//! Application lifecycle: controller, hooks, signals, and bootstrap.

pub mod app;
pub mod bootstrap;
pub mod collaborators;
pub mod hooks;
pub mod signal;

pub use app::{AppHandle, Application, ApplicationState};
pub use bootstrap::{bootstrap, run_to_exit, ExitStatus};
pub use collaborators::{
    Collaborators, ConfigStore, DeviceKind, DeviceProfile, NetworkPoller, OsFamily,
    PlatformServices, ProxyTunnel, ResourceLocator, ScriptEngine,
};
pub use hooks::LifecycleHooks;
pub use signal::SignalBridge;
