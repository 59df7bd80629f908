//! Integration tests for concurrent deposits on a shared account

use std::sync::Arc;
use std::time::Duration;

use lockbank_core::{
    bank_process, run_phase, simulate, Account, CriticalSectionProbe, SimulationConfig,
};

/// Account with a probe attached, default 1 ms delay
fn probed_account() -> (Arc<Account>, CriticalSectionProbe) {
    let probe = CriticalSectionProbe::new();
    let account = Arc::new(Account::new().with_probe(probe.clone()));
    (account, probe)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_default_scenario_hundred_deposits() {
    let (account, probe) = probed_account();
    let config = SimulationConfig::default();

    let report = bank_process(Arc::clone(&account), &config).await.unwrap();

    assert_eq!(report.balances.after_single, 0.0);
    assert_eq!(report.balances.after_concurrent, 200.0);
    assert!(report.matches_expected());

    // 100 warm-up deposits + 2 x 100 concurrent deposits
    assert_eq!(probe.entries(), 300);
    assert_eq!(probe.max_concurrent(), 1);
    assert_eq!(probe.overlaps(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_zero_amount_single_task_keeps_balance() {
    for repetitions in [0, 1, 13, 50] {
        let account = Arc::new(Account::with_delay(Duration::ZERO));

        let balance = run_phase(&account, "warm-up", 1, repetitions, 0.0)
            .await
            .unwrap();

        assert_eq!(balance, 0.0, "repetitions = {}", repetitions);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_tasks_lose_no_deposits() {
    for (repetitions, amount) in [(0, 1.0), (1, 1.0), (25, 2.0), (40, 0.5), (64, 3.0)] {
        let probe = CriticalSectionProbe::new();
        let account = Arc::new(Account::with_delay(Duration::ZERO).with_probe(probe.clone()));

        let balance = run_phase(&account, "contention", 2, repetitions, amount)
            .await
            .unwrap();

        assert_eq!(
            balance,
            2.0 * f64::from(repetitions) * amount,
            "repetitions = {}, amount = {}",
            repetitions,
            amount
        );
        assert_eq!(probe.overlaps(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_tasks_serialize_critical_sections() {
    let (account, probe) = probed_account();

    let balance = run_phase(&account, "eight tasks", 8, 20, 1.0).await.unwrap();

    assert_eq!(balance, 160.0);
    assert_eq!(probe.entries(), 160);
    assert_eq!(probe.max_concurrent(), 1);
    assert_eq!(probe.active(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simulate_with_custom_config() {
    let config = SimulationConfig {
        repetitions: 30,
        warmup_amount: 0.0,
        deposit_amount: 2.5,
        concurrent_tasks: 3,
        processing_delay_ms: 0,
        measure_time: false,
    };

    let report = simulate(&config).await.unwrap();

    assert_eq!(report.balances.after_single, 0.0);
    assert_eq!(report.balances.after_concurrent, 225.0);
    assert_eq!(report.phases[1].tasks, 3);
    assert_eq!(report.phases[1].balance, 225.0);
}

#[tokio::test]
async fn test_aborted_task_does_not_block_phase() {
    let probe = CriticalSectionProbe::new();
    let account =
        Arc::new(Account::with_delay(Duration::from_millis(100)).with_probe(probe.clone()));

    let stuck = {
        let account = Arc::clone(&account);
        tokio::spawn(async move {
            for _ in 0..10 {
                account.deposit(100.0).await;
            }
        })
    };

    while probe.active() == 0 {
        tokio::task::yield_now().await;
    }
    stuck.abort();
    assert!(stuck.await.unwrap_err().is_cancelled());

    let balance = tokio::time::timeout(
        Duration::from_secs(10),
        run_phase(&account, "after abort", 2, 3, 1.0),
    )
    .await
    .expect("phase blocked on a lock held by an aborted task")
    .unwrap();

    assert_eq!(balance, 6.0);
    assert_eq!(probe.overlaps(), 0);
}
