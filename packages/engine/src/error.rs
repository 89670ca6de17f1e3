//! Failure taxonomy surfaced by retried calls
//!
//! A retried call either returns the operation's value or one of the
//! variants of [`RetryError`]. Non-retryable failures and re-raised
//! failures travel through [`RetryError::Operation`] untouched, so callers
//! can recover the exact error the operation produced.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The limit that ended a retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// The configured number of retries was already spent
    Attempts(u32),
    /// The next attempt would have started past the configured deadline
    Deadline(Duration),
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Attempts(max) => write!(f, "retry limit {max} reached"),
            Limit::Deadline(deadline) => write!(f, "time limit {deadline:?} exceeded"),
        }
    }
}

/// Error returned by a retried call
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation's own failure.
    ///
    /// Either a failure the policy does not consider retryable, or the last
    /// retryable failure when the policy re-raises on exhaustion.
    #[error("{0}")]
    Operation(E),

    /// Retries ran out before the operation succeeded
    #[error("{limit} after {attempts} attempts")]
    Exhausted {
        /// Which limit was hit
        limit: Limit,
        /// Total number of times the operation was invoked
        attempts: u32,
        /// Wall-clock time since the first attempt started
        elapsed: Duration,
        /// The last retryable failure
        #[source]
        source: E,
    },

    /// The call was cancelled through its [`CancelToken`](crate::CancelToken)
    #[error("retry cancelled")]
    Cancelled {
        /// The failure observed when cancellation was noticed, if any
        last: Option<E>,
    },

    /// The policy was rejected before the first attempt
    #[error("invalid retry policy: {0}")]
    InvalidPolicy(ConfigError),
}

impl<E> RetryError<E> {
    /// Returns the underlying operation failure, if there is one
    ///
    /// This lets callers handle failures the same way whether or not the
    /// call went through a retry wrapper.
    #[must_use]
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::Operation(error) | RetryError::Exhausted { source: error, .. } => Some(error),
            RetryError::Cancelled { last } => last,
            RetryError::InvalidPolicy(_) => None,
        }
    }

    /// Borrow the underlying operation failure, if there is one
    #[must_use]
    pub fn inner(&self) -> Option<&E> {
        match self {
            RetryError::Operation(error) | RetryError::Exhausted { source: error, .. } => Some(error),
            RetryError::Cancelled { last } => last.as_ref(),
            RetryError::InvalidPolicy(_) => None,
        }
    }

    /// Limit that caused exhaustion, `None` for every other variant
    #[must_use]
    pub fn limit(&self) -> Option<Limit> {
        match self {
            RetryError::Exhausted { limit, .. } => Some(*limit),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }
}

/// Errors raised while building a retry policy
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("multiplier must be a positive finite number, got {0}")]
    InvalidMultiplier(f64),

    #[error("{field} must be a non-negative finite number of seconds, got {value}")]
    InvalidDuration { field: &'static str, value: f64 },

    #[error("unknown log level `{0}`")]
    UnknownLogLevel(String),

    #[error("malformed retry configuration: {0}")]
    Json(#[from] serde_json::Error),
}
