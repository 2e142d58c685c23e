//! Shared recording collaborators for lifecycle and bootstrap tests.
//!
//! Every collaborator appends labeled entries to a shared journal, so tests
//! can assert the exact call order across subsystems.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use parking_lot::Mutex;

use runloop::config::RuntimeConfig;
use runloop::core::AppResult;
use runloop::runtime::{
    AppHandle, Application, Collaborators, ConfigStore, DeviceKind, DeviceProfile,
    LifecycleHooks, NetworkPoller, OsFamily, PlatformServices, ProxyTunnel, ResourceLocator,
    ScriptEngine,
};

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().push(entry.into());
}

/// Asserts the journal holds exactly `expected`, in order.
pub fn assert_journal(journal: &Journal, expected: &[&str]) {
    let actual = journal.lock().clone();
    let expected: Vec<String> = expected.iter().map(ToString::to_string).collect();
    assert_eq!(actual, expected);
}

/// Journal entries starting with `prefix`, in order.
pub fn entries_with_prefix(journal: &Journal, prefix: &str) -> Vec<String> {
    journal
        .lock()
        .iter()
        .filter(|entry| entry.starts_with(prefix))
        .cloned()
        .collect()
}

// ============================================================================
// RECORDING COLLABORATORS
// ============================================================================

pub struct RecordingNetwork {
    journal: Journal,
    /// Number of poll calls; polls are counted, not journaled, to keep the
    /// journal readable.
    pub polls: Arc<AtomicUsize>,
}

impl RecordingNetwork {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Arc::clone(journal),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl NetworkPoller for RecordingNetwork {
    fn poll(&mut self) {
        self.polls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn terminate(&mut self) {
        record(&self.journal, "network.terminate");
    }
}

type RunCallback = Box<dyn FnMut(&AppHandle) + Send>;

pub struct RecordingScript {
    journal: Journal,
    /// Value returned from `safe_run_script`.
    pub script_result: bool,
    handle: Option<AppHandle>,
    on_run: Option<RunCallback>,
}

impl RecordingScript {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Arc::clone(journal),
            script_result: true,
            handle: None,
            on_run: None,
        }
    }

    /// Sets a callback invoked with the attached handle whenever a script
    /// runs, standing in for the script's own startup logic.
    pub fn with_on_run(mut self, on_run: impl FnMut(&AppHandle) + Send + 'static) -> Self {
        self.on_run = Some(Box::new(on_run));
        self
    }

    pub fn failing(mut self) -> Self {
        self.script_result = false;
        self
    }
}

impl ScriptEngine for RecordingScript {
    fn init(&mut self) -> AppResult<()> {
        record(&self.journal, "script.init");
        Ok(())
    }

    fn attach(&mut self, app: &AppHandle) {
        record(&self.journal, "script.attach");
        self.handle = Some(app.clone());
    }

    fn safe_run_script(&mut self, name: &str) -> bool {
        record(&self.journal, format!("script.run:{name}"));
        if let (Some(on_run), Some(handle)) = (self.on_run.as_mut(), self.handle.as_ref()) {
            on_run(handle);
        }
        self.script_result
    }

    fn unload_modules(&mut self) {
        record(&self.journal, "script.unload_modules");
    }

    fn collect_garbage(&mut self) {
        record(&self.journal, "script.collect_garbage");
    }

    fn terminate(&mut self) {
        record(&self.journal, "script.terminate");
    }
}

pub struct RecordingConfigStore {
    journal: Journal,
    /// When set, `init` fails after recording its entry.
    pub fail_init: bool,
}

impl RecordingConfigStore {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Arc::clone(journal),
            fail_init: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_init = true;
        self
    }
}

impl ConfigStore for RecordingConfigStore {
    fn init(&mut self) -> AppResult<()> {
        record(&self.journal, "config.init");
        if self.fail_init {
            anyhow::bail!("settings store refused to load");
        }
        Ok(())
    }

    fn terminate(&mut self) {
        record(&self.journal, "config.terminate");
    }
}

pub struct RecordingResources {
    journal: Journal,
    /// Result of `discover_work_dir`.
    pub work_dir_found: bool,
    /// Result of `launch_correct`.
    pub relaunch: bool,
    /// Reported binary path.
    pub binary: PathBuf,
}

impl RecordingResources {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Arc::clone(journal),
            work_dir_found: true,
            relaunch: false,
            binary: PathBuf::from("recorded-binary"),
        }
    }

    pub fn without_work_dir(mut self) -> Self {
        self.work_dir_found = false;
        self
    }

    pub fn relaunching(mut self) -> Self {
        self.relaunch = true;
        self
    }
}

impl ResourceLocator for RecordingResources {
    fn init(&mut self, argv0: &str) -> AppResult<()> {
        record(&self.journal, format!("resources.init:{argv0}"));
        Ok(())
    }

    fn launch_correct(&mut self, _args: &[String]) -> bool {
        record(&self.journal, "resources.launch_correct");
        self.relaunch
    }

    fn discover_work_dir(&mut self, entry_script: &str) -> bool {
        record(&self.journal, format!("resources.discover:{entry_script}"));
        self.work_dir_found
    }

    fn run_encryption(&mut self, password: Option<&str>) -> AppResult<()> {
        record(
            &self.journal,
            format!("resources.encrypt:{}", password.unwrap_or("<default>")),
        );
        Ok(())
    }

    fn binary_path(&self) -> PathBuf {
        self.binary.clone()
    }

    fn terminate(&mut self) {
        record(&self.journal, "resources.terminate");
    }
}

pub struct RecordingPlatform {
    journal: Journal,
    device: DeviceProfile,
}

impl RecordingPlatform {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Arc::clone(journal),
            device: DeviceProfile {
                kind: DeviceKind::Desktop,
                os: OsFamily::Linux,
            },
        }
    }
}

impl PlatformServices for RecordingPlatform {
    fn process_args(&mut self, _args: &mut Vec<String>) {
        record(&self.journal, "platform.process_args");
    }

    fn set_device(&mut self, device: DeviceProfile) {
        record(&self.journal, format!("platform.set_device:{}", device.os));
        self.device = device;
    }

    fn device(&self) -> DeviceProfile {
        self.device
    }

    fn os_family(&self) -> OsFamily {
        self.device.os
    }

    fn spawn_process(&mut self, binary: &Path, _args: &[String]) -> AppResult<()> {
        record(&self.journal, format!("platform.spawn:{}", binary.display()));
        Ok(())
    }
}

pub struct RecordingProxy {
    journal: Journal,
}

impl RecordingProxy {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Arc::clone(journal),
        }
    }
}

impl ProxyTunnel for RecordingProxy {
    fn init(&mut self) -> AppResult<()> {
        record(&self.journal, "proxy.init");
        Ok(())
    }

    fn terminate(&mut self) {
        record(&self.journal, "proxy.terminate");
    }
}

// ============================================================================
// ASSEMBLY HELPERS
// ============================================================================

/// A full set of recording collaborators over one journal.
pub fn collaborators(journal: &Journal) -> Collaborators {
    Collaborators {
        network: Box::new(RecordingNetwork::new(journal)),
        script: Box::new(RecordingScript::new(journal)),
        config_store: Box::new(RecordingConfigStore::new(journal)),
        resources: Box::new(RecordingResources::new(journal)),
        platform: Box::new(RecordingPlatform::new(journal)),
        proxy: Box::new(RecordingProxy::new(journal)),
    }
}

/// A light configuration for tests: no pacing sleep, one background worker.
pub fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        poll_interval_ms: 0,
        background_workers: Some(1),
    }
}

/// A ready-to-init application over recording collaborators.
pub fn app(journal: &Journal) -> Application {
    Application::new(collaborators(journal), test_config(), LifecycleHooks::new())
        .expect("application should build")
}
