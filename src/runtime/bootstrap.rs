//! Process bootstrap: from raw arguments to a terminated application.

use tracing::{error, info};

use crate::config::{RuntimeConfig, StartupOptions};
use crate::core::StartupError;

use super::app::Application;
use super::collaborators::Collaborators;
use super::hooks::LifecycleHooks;

/// How a bootstrapped process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The full lifecycle ran and shut down in order.
    Clean,
    /// A sibling executable was launched instead; nothing else ran.
    Relaunched,
    /// Assets were encrypted; no application was started.
    EncryptionComplete,
}

impl ExitStatus {
    /// Process exit code for this outcome.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Clean | Self::Relaunched | Self::EncryptionComplete => 0,
        }
    }
}

/// Drives the startup sequence and, for a normal launch, the entire
/// application lifecycle:
///
/// 1. normalize arguments through the platform layer
/// 2. initialize the resource locator from the program path
/// 3. on `--encrypt`: bring up the script engine, encrypt assets, stop
/// 4. hand off to a sibling executable when the locator says so
/// 5. discover the work directory containing `entry_script`
/// 6. initialize the application
/// 7. run the entry script
/// 8. run the poll loop, then deinit and terminate
///
/// # Errors
///
/// Returns [`StartupError::WorkDirNotFound`] when no directory contains the
/// entry script, [`StartupError::EntryScriptFailed`] when the script does
/// not complete, and [`StartupError::Subsystem`] when a collaborator fails
/// to start. All of these are fatal; nothing is left running.
pub fn bootstrap(
    mut args: Vec<String>,
    entry_script: &str,
    mut collaborators: Collaborators,
    config: RuntimeConfig,
    hooks: LifecycleHooks,
) -> Result<ExitStatus, StartupError> {
    collaborators.platform.process_args(&mut args);

    let argv0 = args.first().cloned().unwrap_or_default();
    collaborators
        .resources
        .init(&argv0)
        .map_err(StartupError::Subsystem)?;

    let options = StartupOptions::from_args(args);

    if options.encrypt() {
        collaborators
            .script
            .init()
            .map_err(StartupError::Subsystem)?;
        collaborators
            .resources
            .run_encryption(options.encryption_password())
            .map_err(StartupError::Subsystem)?;
        info!("asset encryption complete");
        return Ok(ExitStatus::EncryptionComplete);
    }

    if collaborators.resources.launch_correct(&options.args) {
        info!("launch delegated to sibling executable");
        return Ok(ExitStatus::Relaunched);
    }

    if !collaborators.resources.discover_work_dir(entry_script) {
        return Err(StartupError::WorkDirNotFound(entry_script.to_owned()));
    }

    let mut app = Application::new(collaborators, config, hooks)?;
    app.init(&options)?;

    if !app.run_script(entry_script) {
        return Err(StartupError::EntryScriptFailed(entry_script.to_owned()));
    }

    app.run();
    app.deinit();
    app.terminate();
    Ok(ExitStatus::Clean)
}

/// [`bootstrap`] wrapped for a `main` function: returns the process exit
/// code on success and aborts on a fatal startup error, after logging it.
pub fn run_to_exit(
    args: Vec<String>,
    entry_script: &str,
    collaborators: Collaborators,
    config: RuntimeConfig,
    hooks: LifecycleHooks,
) -> i32 {
    match bootstrap(args, entry_script, collaborators, config, hooks) {
        Ok(status) => {
            info!(status = ?status, "shutdown complete");
            status.code()
        }
        Err(err) => {
            error!(error = %err, "fatal startup failure");
            std::process::abort();
        }
    }
}
