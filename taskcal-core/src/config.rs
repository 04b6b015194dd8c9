//! Sync configuration.
//!
//! Loaded from `<config_dir>/taskcal/config.toml`; a missing file means
//! defaults. Calendar-provider credentials are configured separately by the
//! provider crate.

use std::path::PathBuf;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_timezone() -> Tz {
    chrono_tz::Europe::Warsaw
}

fn default_duration_min() -> i64 {
    30
}

fn default_lookback_days() -> i64 {
    30
}

fn default_sync_interval_secs() -> u64 {
    60
}

fn default_startup_delay_secs() -> u64 {
    5
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskcal")
        .join("database.json")
}

/// Configuration for the sync engines and scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Fixed timezone attached to timed remote events.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    /// Event length in minutes when a task has no explicit duration.
    ///
    /// Observed client behavior disagreed between 30 and 60 minutes; pinned
    /// here to 30 (the value the drag-resize UI uses) and overridable.
    #[serde(default = "default_duration_min")]
    pub default_duration_min: i64,

    /// How far back the full-resync window reaches when no cursor is stored.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    /// Wall-clock interval between periodic inbound sync batches.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Delay before the first batch after startup.
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,

    /// Location of the per-user JSON store.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            timezone: default_timezone(),
            default_duration_min: default_duration_min(),
            lookback_days: default_lookback_days(),
            sync_interval_secs: default_sync_interval_secs(),
            startup_delay_secs: default_startup_delay_secs(),
            database_path: default_database_path(),
        }
    }
}

impl SyncConfig {
    /// Path of the config file: `<config_dir>/taskcal/config.toml`.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::MissingDir("config"))?;
        Ok(config_dir.join("taskcal").join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(SyncConfig::default());
        }
        Self::load_from(&path)
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
