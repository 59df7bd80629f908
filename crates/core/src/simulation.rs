//! Two-phase deposit simulation
//!
//! Phase 1 runs a single task of zero-amount deposits as a warm-up. Phase 2
//! launches several tasks at once against the same account, so their
//! critical sections contend for the lock. Both phases are joined before the
//! balance is read.

use crate::account::Account;
use crate::config::SimulationConfig;
use crate::error::{SimulationError, SimulationResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Balances read after each phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Balances {
    pub after_single: f64,
    pub after_concurrent: f64,
}

impl fmt::Display for Balances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Balance1: {:?}", self.after_single)?;
        write!(f, "Balance2: {:?}", self.after_concurrent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseReport {
    pub title: String,
    pub tasks: usize,
    pub repetitions: u32,
    pub amount: f64,
    pub balance: f64,
    /// Diagnostic only
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub config: SimulationConfig,
    /// Balance the account held before phase 1
    pub opening_balance: f64,
    pub phases: Vec<PhaseReport>,
    pub balances: Balances,
}

impl SimulationReport {
    /// Balance the account must end on when no deposit is lost
    pub fn expected_final_balance(&self) -> f64 {
        self.opening_balance + self.config.expected_final_balance()
    }

    /// True when no deposit was lost.
    ///
    /// Exact comparison: amounts without an exact binary representation
    /// (0.1, ...) can drift from the product by rounding alone.
    pub fn matches_expected(&self) -> bool {
        self.balances.after_concurrent == self.expected_final_balance()
    }
}

/// Await `future` and return its output with the wall-clock time it took.
///
/// When `enabled`, the timing is also logged. The future runs either way.
pub async fn with_time_measurement<F, T>(title: &str, enabled: bool, future: F) -> (T, Duration)
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    let output = future.await;
    let elapsed = started.elapsed();

    if enabled {
        tracing::info!("operation in '{}' took {} ms", title, elapsed.as_millis());
    }

    (output, elapsed)
}

/// Launch `tasks` tasks together, each making `repetitions` deposits of
/// `amount`, wait for all of them, then return the account balance.
pub async fn run_phase(
    account: &Arc<Account>,
    title: &str,
    tasks: usize,
    repetitions: u32,
    amount: f64,
) -> SimulationResult<f64> {
    let handles: Vec<_> = (0..tasks)
        .map(|task| {
            let account = Arc::clone(account);
            tokio::spawn(async move {
                tracing::debug!(task, repetitions, amount, "deposit task started");
                for _ in 0..repetitions {
                    account.deposit(amount).await;
                }
                tracing::debug!(task, "deposit task finished");
            })
        })
        .collect();

    join_tasks(title, handles).await?;

    Ok(account.balance())
}

/// Wait for every handle, even after one fails, and return the first failure.
async fn join_tasks(phase: &str, handles: Vec<JoinHandle<()>>) -> SimulationResult<()> {
    let mut first_error = None;

    for (task, handle) in handles.into_iter().enumerate() {
        if let Err(source) = handle.await {
            tracing::error!(phase, task, error = %source, "deposit task failed");
            first_error.get_or_insert(SimulationError::TaskFailed {
                phase: phase.to_string(),
                task,
                source,
            });
        }
    }

    first_error.map_or(Ok(()), Err)
}

async fn timed_phase(
    account: &Arc<Account>,
    title: String,
    tasks: usize,
    repetitions: u32,
    amount: f64,
    measure_time: bool,
) -> SimulationResult<PhaseReport> {
    let (balance, elapsed) = with_time_measurement(
        &title,
        measure_time,
        run_phase(account, &title, tasks, repetitions, amount),
    )
    .await;

    Ok(PhaseReport {
        title,
        tasks,
        repetitions,
        amount,
        balance: balance?,
        elapsed,
    })
}

/// Run both phases against `account` and collect the results.
///
/// The account may already hold a balance; the report records it as the
/// opening balance.
pub async fn bank_process(
    account: Arc<Account>,
    config: &SimulationConfig,
) -> SimulationResult<SimulationReport> {
    config.validate()?;
    let opening_balance = account.balance();

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(%run_id, repetitions = config.repetitions, "starting simulation");

    let single = timed_phase(
        &account,
        format!("Single task deposit {} times", config.repetitions),
        1,
        config.repetitions,
        config.warmup_amount,
        config.measure_time,
    )
    .await?;
    tracing::info!("Balance1 after single task: {:?}", single.balance);

    let concurrent = timed_phase(
        &account,
        format!(
            "{} tasks depositing {} times together",
            config.concurrent_tasks, config.repetitions
        ),
        config.concurrent_tasks,
        config.repetitions,
        config.deposit_amount,
        config.measure_time,
    )
    .await?;
    tracing::info!(
        "Balance2 after {} concurrent tasks: {:?}",
        config.concurrent_tasks,
        concurrent.balance
    );

    let balances = Balances {
        after_single: single.balance,
        after_concurrent: concurrent.balance,
    };

    let report = SimulationReport {
        run_id,
        started_at,
        config: config.clone(),
        opening_balance,
        phases: vec![single, concurrent],
        balances,
    };

    if !report.matches_expected() {
        tracing::warn!(
            expected = report.expected_final_balance(),
            actual = balances.after_concurrent,
            "final balance does not match expected total"
        );
    }

    Ok(report)
}

/// Run the simulation on a fresh account built from `config`.
pub async fn simulate(config: &SimulationConfig) -> SimulationResult<SimulationReport> {
    let account = Arc::new(Account::with_delay(config.processing_delay()));
    bank_process(account, config).await
}
