// src/config.rs

//! Manages relay configuration: defaults, an optional TOML file, environment
//! overrides, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding the listen address.
pub const ENV_ADDRESS: &str = "ADDRESS";
/// Environment variable overriding the listen port.
pub const ENV_PORT: &str = "PORT";
/// Environment variable overriding the backup file location.
pub const ENV_BACKUP_PATH: &str = "BACKUP_PATH";
/// Environment variable overriding the backup interval, in whole seconds.
pub const ENV_BACKUP_INTERVAL: &str = "BACKUP_INTERVAL";
/// Environment variable overriding the pending-connection backlog.
pub const ENV_BACKLOG: &str = "BACKLOG";

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_backlog() -> u32 {
    4
}
fn default_backup_path() -> PathBuf {
    PathBuf::from("Backup.txt")
}
fn default_backup_interval() -> Duration {
    Duration::from_secs(30)
}
fn default_max_message_bytes() -> usize {
    1024
}
fn default_shutdown_grace() -> Duration {
    Duration::from_secs(2)
}
fn default_log_level() -> String {
    "info".to_string()
}

/// The resolved relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on connections waiting to be accepted (not on total clients).
    #[serde(default = "default_backlog")]
    pub backlog: u32,
    #[serde(default = "default_backup_path")]
    pub backup_path: PathBuf,
    /// How often the conversation log is flushed to `backup_path`.
    #[serde(default = "default_backup_interval", with = "humantime_serde")]
    pub backup_interval: Duration,
    /// Largest chunk read from a client in one go; also bounds the display name.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// How long shutdown waits for connection workers before aborting them.
    #[serde(default = "default_shutdown_grace", with = "humantime_serde")]
    pub shutdown_grace: Duration,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backlog: default_backlog(),
            backup_path: default_backup_path(),
            backup_interval: default_backup_interval(),
            max_message_bytes: default_max_message_bytes(),
            shutdown_grace: default_shutdown_grace(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Builds the configuration from defaults, an optional TOML file and the process
    /// environment, in increasing order of precedence.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies overrides from an environment lookup. Unset variables leave the current
    /// value alone; set but unparsable ones are an error.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup(ENV_ADDRESS) {
            // An empty address means "all interfaces".
            self.host = if address.trim().is_empty() {
                default_host()
            } else {
                address
            };
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_PORT} value '{port}'"))?;
        }
        if let Some(path) = lookup(ENV_BACKUP_PATH) {
            self.backup_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup(ENV_BACKUP_INTERVAL) {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_BACKUP_INTERVAL} value '{secs}'"))?;
            self.backup_interval = Duration::from_secs(secs);
        }
        if let Some(backlog) = lookup(ENV_BACKLOG) {
            self.backlog = backlog
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_BACKLOG} value '{backlog}'"))?;
        }
        Ok(())
    }

    /// Validates the resolved configuration to ensure logical consistency.
    ///
    /// Port 0 is accepted and asks the OS for an ephemeral port.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.backlog == 0 {
            return Err(anyhow!("backlog cannot be 0"));
        }
        if self.backup_path.as_os_str().is_empty() {
            return Err(anyhow!("backup_path cannot be empty"));
        }
        if self.backup_interval.is_zero() {
            return Err(anyhow!("backup_interval cannot be 0"));
        }
        if self.max_message_bytes == 0 {
            return Err(anyhow!("max_message_bytes cannot be 0"));
        }
        if self.backup_interval < Duration::from_secs(1) {
            warn!(
                "backup_interval is {:?}; the backup file will be rewritten very often.",
                self.backup_interval
            );
        }
        Ok(())
    }
}
