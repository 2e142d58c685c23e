//! Error types for scheduler and lifecycle operations.

use thiserror::Error;

/// Errors produced by dispatch components.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Job rejected because the background pool has shut down.
    #[error("background pool is shut down")]
    PoolShutDown,
    /// A background worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// Fatal conditions raised during process bootstrap and application init.
///
/// These are the only errors that surface to the embedder; steady-state
/// failures are contained at the dispatch-queue boundary.
#[derive(Debug, Error)]
pub enum StartupError {
    /// No directory containing the entry script could be located.
    #[error("work directory not found for entry script `{0}`")]
    WorkDirNotFound(String),
    /// The entry script was found but did not run successfully.
    #[error("entry script `{0}` did not run successfully")]
    EntryScriptFailed(String),
    /// `init` was called on an instance that already left `Uninitialized`.
    #[error("application is already initialized")]
    AlreadyInitialized,
    /// `init` was called on a terminated instance; termination is permanent.
    #[error("application instance was terminated and cannot be reinitialized")]
    Terminated,
    /// Runtime configuration failed validation.
    #[error("invalid runtime configuration: {0}")]
    InvalidConfig(String),
    /// A collaborator subsystem failed while starting up.
    #[error("subsystem initialization failed: {0}")]
    Subsystem(anyhow::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
