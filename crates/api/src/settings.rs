//! Server settings

use data_validator::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "DEVICE_MONITOR_CONFIG";
/// Default config file name (any format the `config` crate knows)
pub const DEFAULT_CONFIG_NAME: &str = "device-monitor";
/// Prefix for environment overrides, e.g. `DEVICE_MONITOR__BIND_ADDR`
pub const ENV_PREFIX: &str = "DEVICE_MONITOR";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Backup file used when a request names none
    pub backup_path: String,
    /// Only accept bare file names for request-supplied backup paths,
    /// resolved inside the directory of `backup_path`
    pub confine_backups: bool,
    /// Restore from `backup_path` before serving
    pub restore_on_startup: bool,
    /// Max log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    /// Input validation limits
    pub validation: ValidationConfig,
    /// Periodic pruning of old records
    pub retention: RetentionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            backup_path: "backup.json".to_string(),
            confine_backups: false,
            restore_on_startup: false,
            log_level: "info".to_string(),
            json_logs: false,
            validation: ValidationConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from the default config file (optional) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let name = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_NAME.to_string());
        Self::load_from(&name)
    }

    /// Load from the named file (optional) and the environment
    pub fn load_from(name: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

/// Retention policy for the background pruning task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Records that ended longer ago than this are pruned; disabled when unset
    pub max_age_secs: Option<u64>,
    /// Seconds between pruning passes
    pub interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: None,
            interval_secs: 3600,
        }
    }
}

impl RetentionConfig {
    /// Maximum record age, if retention is enabled
    pub fn max_age(&self) -> Option<chrono::Duration> {
        self.max_age_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
    }

    /// Pause between pruning passes (at least one second)
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}
