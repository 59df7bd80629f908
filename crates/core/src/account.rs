//! # Account Module
//!
//! An account whose balance is only changed by deposits running under an
//! exclusive async lock. Each deposit reads the balance, waits out a
//! simulated processing delay, then writes the new balance. Without the lock
//! two deposits could read the same balance and one update would be lost.

use crate::config::DEFAULT_PROCESSING_DELAY_MS;
use crate::probe::CriticalSectionProbe;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Shared account. Wrap in an `Arc` to hand it to several tasks.
#[derive(Debug)]
pub struct Account {
    /// f64 bit pattern, so `balance()` can read without the lock
    balance: AtomicU64,
    /// Serializes the read-modify-write sequence of `deposit`
    lock: Mutex<()>,
    processing_delay: Duration,
    probe: Option<CriticalSectionProbe>,
}

impl Account {
    /// Zero balance, default processing delay
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(DEFAULT_PROCESSING_DELAY_MS))
    }

    pub fn with_delay(processing_delay: Duration) -> Self {
        Self {
            balance: AtomicU64::new(0.0_f64.to_bits()),
            lock: Mutex::new(()),
            processing_delay,
            probe: None,
        }
    }

    /// Attach a probe that observes every deposit critical section.
    pub fn with_probe(mut self, probe: CriticalSectionProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Add `amount` to the balance.
    ///
    /// The lock guard lives for the whole read-delay-write sequence and is
    /// released when it drops, so a task cancelled at the delay point never
    /// leaves the account locked and never writes a partial update.
    pub async fn deposit(&self, amount: f64) {
        let _lock = self.lock.lock().await;
        let _section = self.probe.as_ref().map(CriticalSectionProbe::enter);

        let current = self.load();
        if self.processing_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.processing_delay).await;
        }
        let updated = current + amount;
        self.store(updated);

        tracing::trace!(amount, balance = updated, "deposit applied");
    }

    /// Current balance, read without locking.
    ///
    /// Only reliable once every depositing task has been joined.
    pub fn balance(&self) -> f64 {
        self.load()
    }

    pub fn processing_delay(&self) -> Duration {
        self.processing_delay
    }

    pub fn probe(&self) -> Option<&CriticalSectionProbe> {
        self.probe.as_ref()
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.balance.load(Ordering::Acquire))
    }

    fn store(&self, value: f64) {
        self.balance.store(value.to_bits(), Ordering::Release);
    }
}

impl Default for Account {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account (balance: {}, delay: {:?})",
            self.balance(),
            self.processing_delay
        )
    }
}
