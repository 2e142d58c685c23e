//! Runtime configuration and command-line startup options.

use serde::{Deserialize, Serialize};

/// Tunables for the poll loop and background pool.
///
/// # Examples
///
/// ```
/// use runloop::config::RuntimeConfig;
///
/// let config = RuntimeConfig::default();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Pacing delay between poll iterations, in milliseconds. Zero disables
    /// pacing and the loop spins.
    pub poll_interval_ms: u64,
    /// Background worker thread count. `None` selects one per CPU.
    pub background_workers: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1,
            background_workers: None,
        }
    }
}

impl RuntimeConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms > 1_000 {
            return Err("poll_interval_ms must be at most 1000".to_string());
        }
        if self.background_workers == Some(0) {
            return Err("background_workers must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Parses and validates a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a message if the JSON is malformed or validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| format!("invalid runtime config JSON: {e}"))?;
        config.validate()?;
        Ok(config)
    }
}

/// Command-line arguments captured at startup, argv\[0\] included.
///
/// Arguments are kept verbatim so a restarted process can be spawned with
/// exactly the same invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupOptions {
    /// Raw arguments, starting with the program path.
    pub args: Vec<String>,
}

impl StartupOptions {
    /// Wraps an explicit argument vector.
    #[must_use]
    pub fn from_args(args: Vec<String>) -> Self {
        Self { args }
    }

    /// Captures the arguments of the current process.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            args: std::env::args().collect(),
        }
    }

    /// All options after the program path, joined with single spaces.
    #[must_use]
    pub fn joined(&self) -> String {
        match self.args.split_first() {
            Some((_, rest)) => rest.join(" "),
            None => String::new(),
        }
    }

    /// Whether the `-mobile` token appears anywhere in the joined options.
    ///
    /// This is a substring match on the joined string, so tokens embedding
    /// `-mobile` also select the mobile device profile.
    #[must_use]
    pub fn mobile(&self) -> bool {
        self.joined().contains("-mobile")
    }

    /// Whether the exact `--encrypt` argument is present.
    #[must_use]
    pub fn encrypt(&self) -> bool {
        self.args.iter().any(|arg| arg == "--encrypt")
    }

    /// The third argument, used as the encryption password when present.
    #[must_use]
    pub fn encryption_password(&self) -> Option<&str> {
        self.args.get(2).map(String::as_str)
    }
}
