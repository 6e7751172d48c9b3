//! # Node Configuration
//!
//! Unified configuration for the store, its background tasks and its
//! collaborators.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MUSIG_MODE` | `network.mode` |
//! | `MUSIG_LEDGER_HOST` | `network.ledger_host` |
//! | `MUSIG_DATA_DIR` | `storage.data_dir` |
//! | `MUSIG_PENDING_LIMIT` | `store.pending_limit` |
//! | `MUSIG_MAX_PARTICIPANTS` | `store.max_participants` |
//! | `MUSIG_RETENTION_SECS` | `store.retention` |
//! | `MUSIG_EXPIRY_INTERVAL_SECS` | `tasks.expiry_interval` |
//! | `MUSIG_CONFIRMATION_INTERVAL_SECS` | `tasks.confirmation_interval` |
//! | `MUSIG_LEDGER_TIMEOUT_SECS` | `tasks.ledger_timeout` |
//! | `MUSIG_SNAPSHOT_INTERVAL_SECS` | `tasks.snapshot_interval` |

use musig_store::{StoreConfig, TaskConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Participant bound imposed by the one-byte signature index.
const MAX_PARTICIPANTS_CEILING: usize = 256;

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Network configuration.
    pub network: NetworkConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Pending store limits.
    pub store: StoreConfig,
    /// Background task timing.
    pub tasks: TaskConfig,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidVariable {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// A field holds a value the service cannot run with.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network name; also names the snapshot file.
    pub mode: String,
    /// Base URL of the ledger's public API.
    pub ledger_host: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: "testnet".to_string(),
            ledger_host: "http://127.0.0.1:4003".to_string(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `<mode>.json`.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl NodeConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden from `lookup`, then validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup("MUSIG_MODE") {
            config.network.mode = mode;
        }
        if let Some(host) = lookup("MUSIG_LEDGER_HOST") {
            config.network.ledger_host = host;
        }
        if let Some(dir) = lookup("MUSIG_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(limit) = parse_var(&lookup, "MUSIG_PENDING_LIMIT")? {
            config.store.pending_limit = limit;
        }
        if let Some(max) = parse_var(&lookup, "MUSIG_MAX_PARTICIPANTS")? {
            config.store.max_participants = max;
        }
        if let Some(secs) = parse_var(&lookup, "MUSIG_RETENTION_SECS")? {
            config.store.retention = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "MUSIG_EXPIRY_INTERVAL_SECS")? {
            config.tasks.expiry_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "MUSIG_CONFIRMATION_INTERVAL_SECS")? {
            config.tasks.confirmation_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "MUSIG_LEDGER_TIMEOUT_SECS")? {
            config.tasks.ledger_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "MUSIG_SNAPSHOT_INTERVAL_SECS")? {
            config.tasks.snapshot_interval = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mode = &self.network.mode;
        if mode.is_empty()
            || !mode
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::Invalid(format!(
                "mode {:?} must be non-empty and use only letters, digits, '-' or '_'",
                mode
            )));
        }

        let host = &self.network.ledger_host;
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "ledger host {:?} must be an http(s) URL",
                host
            )));
        }

        if self.store.pending_limit == 0 {
            return Err(ConfigError::Invalid("pending limit must be at least 1".into()));
        }
        if self.store.max_participants == 0 || self.store.max_participants > MAX_PARTICIPANTS_CEILING {
            return Err(ConfigError::Invalid(format!(
                "max participants must be between 1 and {}",
                MAX_PARTICIPANTS_CEILING
            )));
        }

        let durations = [
            ("retention", self.store.retention),
            ("expiry interval", self.tasks.expiry_interval),
            ("confirmation interval", self.tasks.confirmation_interval),
            ("ledger timeout", self.tasks.ledger_timeout),
            ("snapshot interval", self.tasks.snapshot_interval),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, d)| d.is_zero()) {
            return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
        }
        Ok(())
    }

    /// Path of the snapshot file for the configured mode.
    pub fn snapshot_path(&self) -> PathBuf {
        self.storage
            .data_dir
            .join(format!("{}.json", self.network.mode))
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError::InvalidVariable {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
