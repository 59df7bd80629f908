//! Simulation configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Deposits performed by each task in a phase
pub const DEFAULT_REPETITIONS: u32 = 100;

/// Per-deposit amount in the single-task phase
pub const DEFAULT_WARMUP_AMOUNT: f64 = 0.0;

/// Per-deposit amount in the concurrent phase
pub const DEFAULT_DEPOSIT_AMOUNT: f64 = 1.0;

/// Tasks launched together in the concurrent phase
pub const DEFAULT_CONCURRENT_TASKS: usize = 2;

/// Artificial delay inside the deposit critical section, in milliseconds
pub const DEFAULT_PROCESSING_DELAY_MS: u64 = 1;

/// Parameters for one run of [`bank_process`](crate::bank_process).
///
/// Every field has a default, so a config file only needs the values it
/// wants to change:
///
/// ```json
/// { "repetitions": 500, "processing_delay_ms": 0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub repetitions: u32,
    pub warmup_amount: f64,
    pub deposit_amount: f64,
    pub concurrent_tasks: usize,
    pub processing_delay_ms: u64,
    /// Log wall-clock time of each phase
    pub measure_time: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            repetitions: DEFAULT_REPETITIONS,
            warmup_amount: DEFAULT_WARMUP_AMOUNT,
            deposit_amount: DEFAULT_DEPOSIT_AMOUNT,
            concurrent_tasks: DEFAULT_CONCURRENT_TASKS,
            processing_delay_ms: DEFAULT_PROCESSING_DELAY_MS,
            measure_time: true,
        }
    }
}

impl SimulationConfig {
    /// Load config from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.warmup_amount.is_finite() {
            return Err(ConfigError::invalid("warmup_amount", "must be a finite number"));
        }
        if !self.deposit_amount.is_finite() {
            return Err(ConfigError::invalid("deposit_amount", "must be a finite number"));
        }
        if self.warmup_amount < 0.0 {
            return Err(ConfigError::invalid("warmup_amount", "must not be negative"));
        }
        if self.deposit_amount < 0.0 {
            return Err(ConfigError::invalid("deposit_amount", "must not be negative"));
        }
        if self.concurrent_tasks == 0 {
            return Err(ConfigError::invalid("concurrent_tasks", "must be at least 1"));
        }
        Ok(())
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    /// Balance the concurrent phase must end on when no deposit is lost
    pub fn expected_final_balance(&self) -> f64 {
        self.warmup_amount * f64::from(self.repetitions)
            + self.deposit_amount * f64::from(self.repetitions) * self.concurrent_tasks as f64
    }
}
