//! # Lockbank Core
//!
//! A shared account balance guarded by an async mutex, plus the two-phase
//! simulation that hammers it with concurrent deposit tasks.

pub mod account;
pub mod config;
pub mod error;
pub mod probe;
pub mod simulation;

pub use account::Account;
pub use config::SimulationConfig;
pub use error::{ConfigError, SimulationError, SimulationResult};
pub use probe::{CriticalSectionProbe, ProbeGuard};
pub use simulation::{
    bank_process, run_phase, simulate, with_time_measurement, Balances, PhaseReport,
    SimulationReport,
};
