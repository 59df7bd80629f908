//! Critical-section instrumentation
//!
//! A probe counts how many deposit critical sections are active at once.
//! Attach one to an [`Account`](crate::Account) to check that the lock
//! really serializes deposits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ProbeState {
    active: AtomicUsize,
    entries: AtomicUsize,
    max_concurrent: AtomicUsize,
    overlaps: AtomicUsize,
}

/// Cloneable handle; clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct CriticalSectionProbe {
    state: Arc<ProbeState>,
}

impl CriticalSectionProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark entry into a critical section. The section ends when the
    /// returned guard is dropped.
    pub fn enter(&self) -> ProbeGuard {
        let previous = self.state.active.fetch_add(1, Ordering::SeqCst);
        self.state.entries.fetch_add(1, Ordering::SeqCst);
        self.state
            .max_concurrent
            .fetch_max(previous + 1, Ordering::SeqCst);
        if previous > 0 {
            self.state.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        ProbeGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Total sections entered
    pub fn entries(&self) -> usize {
        self.state.entries.load(Ordering::SeqCst)
    }

    /// Sections currently running
    pub fn active(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Highest number of sections ever running at the same time
    pub fn max_concurrent(&self) -> usize {
        self.state.max_concurrent.load(Ordering::SeqCst)
    }

    /// Entries that found another section already running
    pub fn overlaps(&self) -> usize {
        self.state.overlaps.load(Ordering::SeqCst)
    }
}

/// Ends a critical section on drop, including when the owning future is cancelled.
#[derive(Debug)]
pub struct ProbeGuard {
    state: Arc<ProbeState>,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_sections_never_overlap() {
        let probe = CriticalSectionProbe::new();

        for _ in 0..5 {
            let _guard = probe.enter();
            assert_eq!(probe.active(), 1);
        }

        assert_eq!(probe.entries(), 5);
        assert_eq!(probe.active(), 0);
        assert_eq!(probe.max_concurrent(), 1);
        assert_eq!(probe.overlaps(), 0);
    }

    #[test]
    fn test_nested_sections_count_as_overlap() {
        let probe = CriticalSectionProbe::new();

        let outer = probe.enter();
        let inner = probe.clone().enter();
        assert_eq!(probe.active(), 2);

        drop(inner);
        drop(outer);

        assert_eq!(probe.entries(), 2);
        assert_eq!(probe.max_concurrent(), 2);
        assert_eq!(probe.overlaps(), 1);
        assert_eq!(probe.active(), 0);
    }

    #[test]
    fn test_unused_probe() {
        let probe = CriticalSectionProbe::new();
        assert_eq!(probe.entries(), 0);
        assert_eq!(probe.max_concurrent(), 0);
    }
}
