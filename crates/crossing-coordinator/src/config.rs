//! Coordinator configuration loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoordinatorError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

/// Timing and channel settings for the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Bounded wait for a remote activate acknowledgment, in milliseconds.
    /// When it elapses the activation fails and state returns to Prepared.
    #[serde(default = "default_activate_timeout_ms")]
    pub activate_timeout_ms: u64,
    /// Bounded wait for a remote deactivate acknowledgment, in milliseconds.
    /// When it elapses the local link is cleared anyway.
    #[serde(default = "default_deactivate_timeout_ms")]
    pub deactivate_timeout_ms: u64,
    /// Bounded wait for a crossing switch-state query, in milliseconds.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Capacity of the inbound adapter event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            activate_timeout_ms: default_activate_timeout_ms(),
            deactivate_timeout_ms: default_deactivate_timeout_ms(),
            query_timeout_ms: default_query_timeout_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl CoordinatorConfig {
    /// Activate acknowledgment window as a [`Duration`].
    pub fn activate_timeout(&self) -> Duration {
        Duration::from_millis(self.activate_timeout_ms)
    }

    /// Deactivate acknowledgment window as a [`Duration`].
    pub fn deactivate_timeout(&self) -> Duration {
        Duration::from_millis(self.deactivate_timeout_ms)
    }

    /// Switch-state query window as a [`Duration`].
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CoordinatorError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            CoordinatorError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = toml::from_str(&raw).map_err(|e| {
            CoordinatorError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        Ok(config)
    }

    /// Default configuration file location under the user config directory.
    pub fn default_path() -> Result<PathBuf, CoordinatorError> {
        dirs::config_dir()
            .map(|dir| dir.join("crossing").join("config.toml"))
            .ok_or_else(|| {
                CoordinatorError::Config("cannot determine config directory".to_string())
            })
    }
}

fn default_activate_timeout_ms() -> u64 {
    2000
}

fn default_deactivate_timeout_ms() -> u64 {
    2000
}

fn default_query_timeout_ms() -> u64 {
    1000
}

fn default_event_capacity() -> usize {
    1024
}
