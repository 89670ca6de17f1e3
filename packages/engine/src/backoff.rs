//! Exponential backoff with optional full jitter
//!
//! [`Backoff`] is the immutable timing part of a policy. [`AttemptState`]
//! is the per-call mutable part: it is created when a retried call starts
//! and dropped when that call returns, so one policy can drive any number
//! of concurrent calls without sharing mutable state.

use std::time::{Duration, Instant};

/// Backoff timing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Sleep before the first retry
    pub initial_delay: Duration,
    /// Growth factor applied to the un-jittered backoff after each retry
    pub multiplier: f64,
    /// Sleep a uniformly random fraction of the un-jittered backoff
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl Backoff {
    /// Un-jittered delay before retry `retry` (0-based)
    ///
    /// Equals `initial_delay * multiplier^retry`, saturating at
    /// [`Duration::MAX`].
    #[must_use]
    pub fn unjittered(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(i32::try_from(retry).unwrap_or(i32::MAX));
        scale(self.initial_delay, factor)
    }
}

/// Mutable state of a single retried call
#[derive(Debug, Clone)]
pub struct AttemptState {
    attempt: u32,
    unjittered: Duration,
    started: Instant,
    deadline_at: Option<Instant>,
}

impl AttemptState {
    /// Start tracking a call whose first attempt begins now
    ///
    /// A deadline too large to represent as an [`Instant`] is treated as
    /// unbounded.
    #[must_use]
    pub fn start(backoff: &Backoff, deadline: Option<Duration>) -> Self {
        let started = Instant::now();
        Self {
            attempt: 0,
            unjittered: backoff.initial_delay,
            started,
            deadline_at: deadline.and_then(|d| started.checked_add(d)),
        }
    }

    /// Number of retries already scheduled
    #[inline]
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Baseline for the next delay, before jitter
    #[inline]
    #[must_use]
    pub fn unjittered(&self) -> Duration {
        self.unjittered
    }

    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Compute the delay before the next attempt and advance the baseline
    ///
    /// The returned delay is taken from the baseline before it is
    /// multiplied, so the first retry waits exactly `initial_delay` (or a
    /// jittered fraction of it). Jitter never feeds back into the baseline.
    pub fn next_delay(&mut self, backoff: &Backoff) -> Duration {
        let delay = if backoff.jitter {
            scale(self.unjittered, fastrand::f64())
        } else {
            self.unjittered
        };
        self.unjittered = scale(self.unjittered, backoff.multiplier);
        delay
    }

    /// Whether an attempt starting after `delay` would begin past the deadline
    #[must_use]
    pub fn overshoots_deadline(&self, delay: Duration) -> bool {
        match self.deadline_at {
            Some(deadline_at) => Instant::now()
                .checked_add(delay)
                .is_none_or(|next_start| next_start > deadline_at),
            None => false,
        }
    }

    /// Record that a retry has been scheduled
    #[inline]
    pub fn advance(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
    }
}

/// Multiply a duration by a non-negative factor, saturating on overflow
fn scale(duration: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(duration.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(initial_ms: u64, multiplier: f64) -> Backoff {
        Backoff {
            initial_delay: Duration::from_millis(initial_ms),
            multiplier,
            jitter: false,
        }
    }

    #[test]
    fn first_delay_is_initial_delay() {
        let backoff = fixed(100, 2.0);
        let mut state = AttemptState::start(&backoff, None);
        assert_eq!(state.next_delay(&backoff), Duration::from_millis(100));
        assert_eq!(state.unjittered(), Duration::from_millis(200));
    }

    #[test]
    fn delays_grow_exponentially_without_jitter() {
        let backoff = fixed(100, 2.0);
        let mut state = AttemptState::start(&backoff, None);
        let delays: Vec<_> = (0..4).map(|_| state.next_delay(&backoff)).collect();
        assert_eq!(
            delays,
            [100, 200, 400, 800].map(Duration::from_millis).to_vec()
        );
        for (k, delay) in delays.iter().enumerate() {
            assert_eq!(*delay, backoff.unjittered(u32::try_from(k).unwrap()));
        }
    }

    #[test]
    fn multiplier_of_one_is_constant() {
        let backoff = fixed(50, 1.0);
        let mut state = AttemptState::start(&backoff, None);
        for _ in 0..5 {
            assert_eq!(state.next_delay(&backoff), Duration::from_millis(50));
        }
    }

    #[test]
    fn jittered_delay_stays_within_baseline() {
        let backoff = Backoff {
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            jitter: true,
        };
        let mut state = AttemptState::start(&backoff, None);
        for k in 0..10 {
            let ceiling = backoff.unjittered(k);
            let delay = state.next_delay(&backoff);
            assert!(delay <= ceiling, "retry {k}: {delay:?} > {ceiling:?}");
            assert_eq!(state.unjittered(), backoff.unjittered(k + 1));
        }
    }

    #[test]
    fn growth_saturates_instead_of_panicking() {
        let backoff = fixed(1_000, 1e6);
        let mut state = AttemptState::start(&backoff, None);
        for _ in 0..20 {
            state.next_delay(&backoff);
        }
        assert_eq!(state.unjittered(), Duration::MAX);
        assert_eq!(state.next_delay(&backoff), Duration::MAX);
    }

    #[test]
    fn zero_deadline_rejects_any_positive_delay() {
        let backoff = fixed(10, 2.0);
        let state = AttemptState::start(&backoff, Some(Duration::ZERO));
        assert!(state.overshoots_deadline(Duration::from_millis(10)));
    }

    #[test]
    fn unbounded_deadline_never_overshoots() {
        let backoff = fixed(10, 2.0);
        let state = AttemptState::start(&backoff, None);
        assert!(!state.overshoots_deadline(Duration::MAX));

        let state = AttemptState::start(&backoff, Some(Duration::from_secs(3600)));
        assert!(!state.overshoots_deadline(Duration::from_millis(10)));
        assert!(state.overshoots_deadline(Duration::MAX));
    }
}
