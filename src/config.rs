//! Run configuration for the engine: the cooperative poll interval and the
//! per-test timeout, with an optional `attest.toml` loader for hosts that
//! keep engine settings next to the project.
use serde::Deserialize;
use std::{
    path::Path,
    time::Duration,
};

use crate::errors::EngineError;

/// On-disk shape of the configuration, read from an `attest.toml` file.
#[derive(Debug, Deserialize)]
pub struct FileConfig {
    /// Poll interval in milliseconds. Defaults to 5.
    pub tick_ms: Option<u64>,
    /// Per-test timeout in seconds. Absent means the default; `0` disables
    /// the timeout entirely.
    pub timeout_secs: Option<u64>,
}

/// Resolved configuration applied to every unit of a run.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    /// Fixed delay used before a unit begins and between completion polls.
    pub tick: Duration,
    /// Bound on how long an in-flight test body may stay pending.
    /// `None` polls indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            tick: Duration::from_millis(5),
            timeout: Some(Duration::from_secs(1200)),
        }
    }
}

impl RunConfig {
    /// Create a configuration by reading the `attest.toml` in `conf_dir`.
    pub fn from_path(conf_dir: &Path) -> Result<Self, EngineError> {
        let conf_path = conf_dir.join("attest.toml");
        let contents = std::fs::read_to_string(&conf_path).map_err(|err| {
            EngineError::InvalidConfig(format!(
                "{}: {}",
                conf_path.to_string_lossy(),
                err
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse a configuration from the contents of an `attest.toml`.
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let conf: FileConfig = toml::from_str(contents).map_err(|err| {
            EngineError::InvalidConfig(format!("failed to parse configuration: {}", err))
        })?;
        Ok(conf.into())
    }
}

impl From<FileConfig> for RunConfig {
    fn from(conf: FileConfig) -> Self {
        let defaults = RunConfig::default();
        RunConfig {
            tick: conf
                .tick_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick),
            timeout: match conf.timeout_secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.timeout,
            },
        }
    }
}
