//! TOML-based configuration for the relay.
//!
//! The file path comes from `--config` (default `config/config.toml`).
//! Example:
//!
//! ```toml
//! id = "relay-01"
//! log_level = "info"
//!
//! [reader]
//! polling_interval_ms = 1000
//!
//! [[devices]]
//! id = "scanner-a"
//! vid = 0x05e0
//! pid = 0x1200
//! full_scan_regex = '^.*\n$'
//!
//! [target]
//! type = "redis"            # or "dummy"
//! host = "127.0.0.1"
//! port = 6379
//! password = "secret"
//! stream = "scans"
//! retry_interval_ms = 5000
//!
//! [heartbeat]               # optional
//! type = "redis"
//! interval_ms = 10000
//! stream = "heartbeats"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the file.  The sink `type`
//! selects an enum variant; an unrecognised type is a parse error rather than
//! a silent fallback.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use relay_core::{DeviceIdentity, DomainError};
use serde::Deserialize;
use thiserror::Error;

use crate::application::device_reader::{ReaderSettings, DEFAULT_POLLING_INTERVAL};
use crate::application::lifecycle::{HeartbeatPlan, RelayPlan};
use crate::application::sender::{SenderSettings, DEFAULT_RETRY_INTERVAL};

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A device entry is invalid (bad pattern or empty id).
    #[error(transparent)]
    Device(#[from] DomainError),

    #[error("relay id must not be empty")]
    EmptyRelayId,

    #[error("no devices configured")]
    NoDevices,

    #[error("device id {0:?} is configured more than once")]
    DuplicateDevice(String),

    /// A duration that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("{0} must not be empty")]
    EmptyStream(&'static str),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level relay configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RelayConfig {
    /// Relay identifier written into every record.
    pub id: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    pub target: TargetConfig,
    #[serde(default)]
    pub heartbeat: Option<HeartbeatConfig>,
}

/// Device reader tunables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReaderConfig {
    /// Wait between acquisition attempts while a device is absent.
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
}

/// One `[[devices]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceConfig {
    pub id: String,
    pub vid: u16,
    pub pid: u16,
    /// Boundary pattern tested against the whole buffer after every key.
    pub full_scan_regex: String,
}

/// The `[target]` section: where scans are delivered.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TargetConfig {
    #[serde(flatten)]
    pub sink: SinkConfig,
    #[serde(default = "default_scan_stream")]
    pub stream: String,
    /// Backoff between delivery attempts of the same scan.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

/// The optional `[heartbeat]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HeartbeatConfig {
    #[serde(flatten)]
    pub sink: SinkConfig,
    #[serde(default = "default_heartbeat_stream")]
    pub stream: String,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub interval_ms: u64,
}

/// Sink implementation, selected by `type`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Redis(RedisConfig),
    /// Log-only sink; every append succeeds.
    Dummy,
}

/// Connection settings for a Redis target.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RedisConfig {
    #[serde(default = "default_redis_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    /// ACL user; empty or absent authenticates as the default user.
    #[serde(default)]
    pub username: Option<String>,
    /// Empty or absent skips `AUTH`.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_polling_interval_ms() -> u64 {
    DEFAULT_POLLING_INTERVAL.as_millis() as u64
}
fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL.as_millis() as u64
}
fn default_scan_stream() -> String {
    "scans".to_string()
}
fn default_heartbeat_stream() -> String {
    "heartbeats".to_string()
}
fn default_heartbeat_interval_ms() -> u64 {
    10_000
}
fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}
fn default_redis_port() -> u16 {
    6379
}
fn default_connect_timeout_ms() -> u64 {
    2_000
}
fn default_io_timeout_ms() -> u64 {
    2_000
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            polling_interval_ms: default_polling_interval_ms(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            username: None,
            password: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

// ── Loading and validation ────────────────────────────────────────────────────

/// Reads and parses the configuration file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if the TOML is malformed or does not match the
/// schema.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    RelayConfig::from_toml(&content)
}

impl RelayConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Compiles every device entry into a [`DeviceIdentity`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDevices`] for an empty list,
    /// [`ConfigError::DuplicateDevice`] when two entries share an id, and
    /// [`ConfigError::Device`] for an invalid pattern or empty id.
    pub fn device_identities(&self) -> Result<Vec<DeviceIdentity>, ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        let mut seen = HashSet::new();
        self.devices
            .iter()
            .map(|device| {
                if !seen.insert(device.id.as_str()) {
                    return Err(ConfigError::DuplicateDevice(device.id.clone()));
                }
                Ok(DeviceIdentity::new(
                    device.id.as_str(),
                    device.vid,
                    device.pid,
                    &device.full_scan_regex,
                )?)
            })
            .collect()
    }

    /// Validates the configuration and builds the pipeline plan.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] other than `Io` and `Parse`.
    pub fn plan(&self) -> Result<RelayPlan, ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptyRelayId);
        }
        let devices = self.device_identities()?;

        let polling_interval =
            positive_millis(self.reader.polling_interval_ms, "reader.polling_interval_ms")?;
        let retry_interval =
            positive_millis(self.target.retry_interval_ms, "target.retry_interval_ms")?;
        if self.target.stream.is_empty() {
            return Err(ConfigError::EmptyStream("target.stream"));
        }

        let heartbeat = match &self.heartbeat {
            Some(hb) => {
                if hb.stream.is_empty() {
                    return Err(ConfigError::EmptyStream("heartbeat.stream"));
                }
                Some(HeartbeatPlan {
                    stream: hb.stream.clone(),
                    interval: positive_millis(hb.interval_ms, "heartbeat.interval_ms")?,
                })
            }
            None => None,
        };

        Ok(RelayPlan {
            relay_id: self.id.clone(),
            devices,
            reader: ReaderSettings { polling_interval },
            sender: SenderSettings { retry_interval },
            scan_stream: self.target.stream.clone(),
            heartbeat,
        })
    }
}

fn positive_millis(ms: u64, field: &'static str) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::ZeroInterval(field));
    }
    Ok(Duration::from_millis(ms))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
