//! # Error Module
//!
//! Errors for config loading and the simulation driver. Deposits themselves
//! have no failure path.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`SimulationConfig`](crate::SimulationConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised by the simulation driver.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Deposit task {task} in phase '{phase}' failed: {source}")]
    TaskFailed {
        phase: String,
        task: usize,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Result type alias for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
