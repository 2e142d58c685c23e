//! Core scheduling primitives: clock, dispatch queues, background workers.

pub mod background;
pub mod clock;
pub mod error;
pub mod queue;
pub mod task;

pub use background::BackgroundPool;
pub use clock::{Clock, ManualTime, MonotonicTime, TimeSource};
pub use error::{AppResult, DispatchError, StartupError};
pub use queue::{DispatchQueue, QueueStats};
pub use task::TaskHandle;
