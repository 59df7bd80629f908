//! Lockbank CLI - run the concurrent deposit simulation
//!
//! Usage:
//! ```bash
//! lockbank
//! lockbank --repetitions 500 --tasks 4
//! lockbank --config sim.json --delay-ms 0 --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use lockbank_core::{simulate, SimulationConfig};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Lockbank - concurrent deposits against a mutex-guarded account
#[derive(Parser)]
#[command(name = "lockbank")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Deposits per task
    #[arg(long, short = 'n')]
    pub repetitions: Option<u32>,

    /// Amount per deposit in the concurrent phase
    #[arg(long, short, allow_negative_numbers = true)]
    pub amount: Option<f64>,

    /// Tasks launched together in the concurrent phase
    #[arg(long, short)]
    pub tasks: Option<usize>,

    /// Processing delay inside each deposit, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Do not log phase timings
    #[arg(long)]
    pub no_timing: bool,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    fn resolve_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_file(path)
                .with_context(|| format!("loading config from {:?}", path))?,
            None => SimulationConfig::default(),
        };

        if let Some(repetitions) = self.repetitions {
            config.repetitions = repetitions;
        }
        if let Some(amount) = self.amount {
            config.deposit_amount = amount;
        }
        if let Some(tasks) = self.tasks {
            config.concurrent_tasks = tasks;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.processing_delay_ms = delay_ms;
        }
        if self.no_timing {
            config.measure_time = false;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lockbank=info,lockbank_core=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let report = simulate(&config).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.balances);
    }

    Ok(())
}
