//! Host-platform services for native targets.

use std::path::Path;

use tracing::{debug, info};

use crate::core::AppResult;
use crate::runtime::{DeviceKind, DeviceProfile, OsFamily, PlatformServices};

/// Platform layer backed by the standard library.
#[derive(Debug, Clone, Copy)]
pub struct NativePlatform {
    device: DeviceProfile,
}

impl NativePlatform {
    /// Creates a platform reporting the compile-time OS and a desktop
    /// device profile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            device: DeviceProfile {
                kind: DeviceKind::Desktop,
                os: compiled_os(),
            },
        }
    }
}

impl Default for NativePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformServices for NativePlatform {
    fn process_args(&mut self, _args: &mut Vec<String>) {
        // std::env::args already yields unicode arguments on native targets.
    }

    fn set_device(&mut self, device: DeviceProfile) {
        debug!(kind = ?device.kind, os = %device.os, "device profile overridden");
        self.device = device;
    }

    fn device(&self) -> DeviceProfile {
        self.device
    }

    fn os_family(&self) -> OsFamily {
        self.device.os
    }

    fn spawn_process(&mut self, binary: &Path, args: &[String]) -> AppResult<()> {
        let child = std::process::Command::new(binary)
            .args(args.iter().skip(1))
            .spawn()?;
        info!(binary = %binary.display(), pid = child.id(), "spawned detached process");
        Ok(())
    }
}

const fn compiled_os() -> OsFamily {
    if cfg!(target_os = "windows") {
        OsFamily::Windows
    } else if cfg!(target_os = "macos") {
        OsFamily::Mac
    } else if cfg!(target_os = "android") {
        OsFamily::Android
    } else if cfg!(target_os = "linux") {
        OsFamily::Linux
    } else if cfg!(target_arch = "wasm32") {
        OsFamily::Browser
    } else {
        OsFamily::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_override_sticks() {
        let mut platform = NativePlatform::new();
        assert_eq!(platform.device().kind, DeviceKind::Desktop);

        platform.set_device(DeviceProfile {
            kind: DeviceKind::Mobile,
            os: OsFamily::Android,
        });
        assert_eq!(platform.device().kind, DeviceKind::Mobile);
        assert_eq!(platform.os_family(), OsFamily::Android);
    }
}
