//! Script engine stand-in for embedders without a scripting layer.

use tracing::debug;

use crate::core::AppResult;
use crate::runtime::{AppHandle, ScriptEngine};

/// Engine that accepts every script and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScript;

impl ScriptEngine for NullScript {
    fn init(&mut self) -> AppResult<()> {
        Ok(())
    }

    fn attach(&mut self, _app: &AppHandle) {}

    fn safe_run_script(&mut self, name: &str) -> bool {
        debug!(script = name, "null engine accepted script");
        true
    }

    fn unload_modules(&mut self) {}

    fn collect_garbage(&mut self) {}

    fn terminate(&mut self) {}
}
