//! Filesystem-backed resource locator.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::AppResult;
use crate::runtime::ResourceLocator;

/// Locator that probes real directories for the entry script.
///
/// With no explicit search paths it probes the current directory and the
/// directory of the running binary, in that order.
#[derive(Debug, Default)]
pub struct FsResources {
    search_paths: Vec<PathBuf>,
    work_dir: Option<PathBuf>,
    binary: PathBuf,
}

impl FsResources {
    /// Creates a locator with the default probe order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a locator probing only `search_paths`, in order.
    #[must_use]
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            ..Self::default()
        }
    }

    /// The directory recorded by a successful discovery.
    #[must_use]
    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    fn candidates(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut candidates = Vec::with_capacity(2);
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd);
        }
        if let Some(dir) = self.binary.parent() {
            if !dir.as_os_str().is_empty() {
                candidates.push(dir.to_path_buf());
            }
        }
        candidates
    }
}

impl ResourceLocator for FsResources {
    fn init(&mut self, argv0: &str) -> AppResult<()> {
        self.binary = std::env::current_exe().unwrap_or_else(|_| PathBuf::from(argv0));
        debug!(binary = %self.binary.display(), "resource locator ready");
        Ok(())
    }

    fn launch_correct(&mut self, _args: &[String]) -> bool {
        // A plain filesystem layout has no sibling executable to prefer.
        false
    }

    fn discover_work_dir(&mut self, entry_script: &str) -> bool {
        for dir in self.candidates() {
            if dir.join(entry_script).is_file() {
                info!(dir = %dir.display(), "work directory discovered");
                self.work_dir = Some(dir);
                return true;
            }
        }
        false
    }

    fn run_encryption(&mut self, _password: Option<&str>) -> AppResult<()> {
        anyhow::bail!("asset encryption is not supported by the filesystem locator")
    }

    fn binary_path(&self) -> PathBuf {
        self.binary.clone()
    }

    fn terminate(&mut self) {
        self.work_dir = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be past the epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("runloop-res-{}-{nanos}", std::process::id()));
        fs::create_dir_all(&dir).expect("scratch dir should be creatable");
        dir
    }

    #[test]
    fn discovery_finds_the_entry_script() {
        let dir = scratch_dir();
        fs::write(dir.join("boot.script"), "-- entry").expect("script should be writable");

        let mut resources = FsResources::with_search_paths(vec![dir.clone()]);
        resources.init("app").expect("init should succeed");

        assert!(resources.discover_work_dir("boot.script"));
        assert_eq!(resources.work_dir(), Some(dir.as_path()));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn discovery_fails_when_the_script_is_absent() {
        let dir = scratch_dir();
        let mut resources = FsResources::with_search_paths(vec![dir.clone()]);
        resources.init("app").expect("init should succeed");

        assert!(!resources.discover_work_dir("boot.script"));
        assert_eq!(resources.work_dir(), None);

        let _ = fs::remove_dir_all(dir);
    }
}
