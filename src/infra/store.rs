//! Settings store stand-in for embedders without persistent settings.

use crate::core::AppResult;
use crate::runtime::ConfigStore;

/// Store that persists nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullConfigStore;

impl ConfigStore for NullConfigStore {
    fn init(&mut self) -> AppResult<()> {
        Ok(())
    }

    fn terminate(&mut self) {}
}
