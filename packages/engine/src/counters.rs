//! Opt-in outcome counters for retried calls
//!
//! A policy built with [`RetryPolicyBuilder::counters`](crate::RetryPolicyBuilder::counters)
//! shares one [`RetryCounters`] across every call made through it. Policies
//! without counters touch no shared state besides their log sink.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Limit;

/// How a retried call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Succeeded,
    /// Failure outside the retryable set, passed through
    Rejected,
    Exhausted(Limit),
    Cancelled,
}

/// Point-in-time copy of a [`RetryCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub calls: u64,
    pub retries: u64,
    pub successes: u64,
    pub rejected: u64,
    pub exhausted_by_count: u64,
    pub exhausted_by_deadline: u64,
    pub cancelled: u64,
}

impl CounterSnapshot {
    /// Calls that ended in any failure
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.rejected + self.exhausted_by_count + self.exhausted_by_deadline + self.cancelled
    }

    /// Fraction of finished calls that returned a value, `None` before any finished
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_ratio(&self) -> Option<f64> {
        let finished = self.successes + self.failures();
        (finished > 0).then(|| self.successes as f64 / finished as f64)
    }

    /// Mean retries scheduled per started call
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn retries_per_call(&self) -> Option<f64> {
        (self.calls > 0).then(|| self.retries as f64 / self.calls as f64)
    }
}

/// Atomic counters shared by the calls of one or more policies
#[derive(Debug, Default)]
pub struct RetryCounters {
    calls: AtomicU64,
    retries: AtomicU64,
    successes: AtomicU64,
    rejected: AtomicU64,
    exhausted_by_count: AtomicU64,
    exhausted_by_deadline: AtomicU64,
    cancelled: AtomicU64,
}

impl RetryCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn call_started(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn retry_scheduled(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn call_finished(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Succeeded => &self.successes,
            Outcome::Rejected => &self.rejected,
            Outcome::Exhausted(Limit::Attempts(_)) => &self.exhausted_by_count,
            Outcome::Exhausted(Limit::Deadline(_)) => &self.exhausted_by_deadline,
            Outcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter
    ///
    /// Counters are read one at a time, so a snapshot taken while calls are
    /// in flight may be off by the events recorded in between.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CounterSnapshot {
            calls: load(&self.calls),
            retries: load(&self.retries),
            successes: load(&self.successes),
            rejected: load(&self.rejected),
            exhausted_by_count: load(&self.exhausted_by_count),
            exhausted_by_deadline: load(&self.exhausted_by_deadline),
            cancelled: load(&self.cancelled),
        }
    }

    /// Return the current values and zero every counter
    pub fn take(&self) -> CounterSnapshot {
        let take = |c: &AtomicU64| c.swap(0, Ordering::Relaxed);
        CounterSnapshot {
            calls: take(&self.calls),
            retries: take(&self.retries),
            successes: take(&self.successes),
            rejected: take(&self.rejected),
            exhausted_by_count: take(&self.exhausted_by_count),
            exhausted_by_deadline: take(&self.exhausted_by_deadline),
            cancelled: take(&self.cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn ratios_are_undefined_before_any_call() {
        let snapshot = RetryCounters::new().snapshot();
        assert_eq!(snapshot.success_ratio(), None);
        assert_eq!(snapshot.retries_per_call(), None);
    }

    #[test]
    fn outcomes_land_in_their_own_counter() {
        let counters = RetryCounters::new();
        for _ in 0..5 {
            counters.call_started();
        }
        counters.retry_scheduled();
        counters.retry_scheduled();
        counters.call_finished(Outcome::Succeeded);
        counters.call_finished(Outcome::Succeeded);
        counters.call_finished(Outcome::Rejected);
        counters.call_finished(Outcome::Exhausted(Limit::Attempts(3)));
        counters.call_finished(Outcome::Exhausted(Limit::Deadline(Duration::ZERO)));

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.exhausted_by_count, 1);
        assert_eq!(snapshot.exhausted_by_deadline, 1);
        assert_eq!(snapshot.cancelled, 0);
        assert_eq!(snapshot.failures(), 3);
        assert!((snapshot.success_ratio().unwrap() - 0.4).abs() < 1e-9);
        assert!((snapshot.retries_per_call().unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn take_drains_the_counters() {
        let counters = RetryCounters::new();
        counters.call_started();
        counters.call_finished(Outcome::Cancelled);

        let taken = counters.take();
        assert_eq!(taken.calls, 1);
        assert_eq!(taken.cancelled, 1);
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }
}
