//! Proxy manager stand-in for direct connections.

use crate::core::AppResult;
use crate::runtime::ProxyTunnel;

/// Proxy manager that tunnels nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProxy;

impl ProxyTunnel for NullProxy {
    fn init(&mut self) -> AppResult<()> {
        Ok(())
    }

    fn terminate(&mut self) {}
}
