//! Configuration loading, validation, and management for Wayfarer.
//!
//! Loads configuration from `~/.wayfarer/config.toml` (or the path in
//! `WAYFARER_CONFIG`) with environment variable overrides. Validates all
//! settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "WAYFARER_CONFIG";

/// Environment variable overriding `transport.call_timeout_secs`.
pub const CALL_TIMEOUT_ENV: &str = "WAYFARER_CALL_TIMEOUT_SECS";

/// The root configuration structure.
///
/// Maps directly to `~/.wayfarer/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Timeouts for worker exchanges
    #[serde(default)]
    pub transport: TransportConfig,

    /// Decoration of composed answers
    #[serde(default)]
    pub response: ResponseConfig,

    /// Backend workers, in registry order
    #[serde(default = "default_workers")]
    pub workers: Vec<WorkerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Upper bound on one capability call
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Upper bound on one worker's discovery exchange
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_secs: u64,
}

fn default_call_timeout() -> u64 {
    15
}
fn default_discovery_timeout() -> u64 {
    5
}

impl TransportConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout(),
            discovery_timeout_secs: default_discovery_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Width of the `=` divider between composed sections
    #[serde(default = "default_divider_width")]
    pub divider_width: usize,

    /// Fixed text appended to every composed answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

fn default_divider_width() -> usize {
    60
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            divider_width: default_divider_width(),
            disclaimer: None,
        }
    }
}

/// One backend worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Unique worker identifier; becomes the owner in qualified names
    pub name: String,

    /// Disabled workers are skipped at startup (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How the worker is reached
    pub kind: WorkerKind,
}

fn default_true() -> bool {
    true
}

impl WorkerConfig {
    pub fn builtin(name: impl Into<String>, worker: BuiltinWorker) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            kind: WorkerKind::Builtin { worker },
        }
    }
}

/// How a worker is launched or connected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerKind {
    /// Hosted in-process
    Builtin { worker: BuiltinWorker },

    /// A child process speaking line-delimited JSON-RPC over stdio
    Process {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
    },
}

/// The workers shipped with Wayfarer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinWorker {
    Utility,
    DemoTrains,
    LiveTrains,
    Hotels,
}

impl BuiltinWorker {
    pub const ALL: [BuiltinWorker; 4] = [
        BuiltinWorker::Utility,
        BuiltinWorker::DemoTrains,
        BuiltinWorker::LiveTrains,
        BuiltinWorker::Hotels,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinWorker::Utility => "utility",
            BuiltinWorker::DemoTrains => "demo_trains",
            BuiltinWorker::LiveTrains => "live_trains",
            BuiltinWorker::Hotels => "hotels",
        }
    }
}

impl std::fmt::Display for BuiltinWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BuiltinWorker {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.as_str() == s.replace('-', "_"))
            .ok_or_else(|| ConfigError::ValidationError(format!("unknown built-in worker '{s}'")))
    }
}

fn default_workers() -> Vec<WorkerConfig> {
    vec![
        WorkerConfig::builtin("greeter", BuiltinWorker::Utility),
        WorkerConfig::builtin("trainline", BuiltinWorker::DemoTrains),
        WorkerConfig::builtin("real_trainline", BuiltinWorker::LiveTrains),
        WorkerConfig::builtin("multi_hotels", BuiltinWorker::Hotels),
    ]
}

impl AppConfig {
    /// Load configuration from `WAYFARER_CONFIG` or the default path,
    /// then apply environment overrides:
    /// - `WAYFARER_CALL_TIMEOUT_SECS`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(CALL_TIMEOUT_ENV) {
            self.transport.call_timeout_secs = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "{CALL_TIMEOUT_ENV} must be a whole number of seconds, got '{raw}'"
                ))
            })?;
        }
        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".wayfarer")
    }

    /// The config file in use: `WAYFARER_CONFIG` if set, else the default.
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.call_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "transport.call_timeout_secs must be > 0".into(),
            ));
        }
        if self.transport.discovery_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "transport.discovery_timeout_secs must be > 0".into(),
            ));
        }
        if self.response.divider_width == 0 {
            return Err(ConfigError::ValidationError(
                "response.divider_width must be > 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for worker in &self.workers {
            if worker.name.trim().is_empty() {
                return Err(ConfigError::ValidationError("worker name must not be empty".into()));
            }
            if !seen.insert(worker.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate worker name '{}'",
                    worker.name
                )));
            }
            if let WorkerKind::Process { command, .. } = &worker.kind {
                if command.trim().is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "worker '{}' has an empty command",
                        worker.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Enabled workers, in registry order.
    pub fn enabled_workers(&self) -> impl Iterator<Item = &WorkerConfig> {
        self.workers.iter().filter(|w| w.enabled)
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            response: ResponseConfig::default(),
            workers: default_workers(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
