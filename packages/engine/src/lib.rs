//! # Rebound retry engine
//!
//! Retries blocking and async operations under an immutable policy:
//! exponential backoff with optional full jitter, a retry-count limit, a
//! deadline on scheduling further attempts, and one log record per retried
//! attempt.
//!
//! ## Features
//!
//! - **One state machine, two execution modes** chosen when an operation
//!   is wrapped: blocking sleeps or cooperative `tokio` suspension
//! - **Per-call state** so a wrapped operation can be called concurrently
//!   without locking
//! - **Typed failures**: pass-through, re-raise, or a distinguished
//!   exhaustion error chaining the last failure
//! - **Pluggable log sinks** over `tracing` or the `log` facade
//! - **Cancellation** that is never mistaken for a retryable failure

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod backoff;
pub mod cancel;
pub mod config;
pub mod counters;
pub mod error;
pub mod executor;
pub mod helpers;
pub mod operation;
pub mod policy;
pub mod sink;

pub use backoff::{AttemptState, Backoff};
pub use cancel::CancelToken;
pub use config::RetryConfig;
pub use counters::{CounterSnapshot, RetryCounters};
pub use error::{ConfigError, Limit, RetryError};
pub use executor::{Blocking, Cooperative, Mode, Retrying};
pub use helpers::{retry, retry_async, wrap, wrap_async};
pub use operation::Operation;
pub use policy::{BoxError, Classifier, RetryPolicy, RetryPolicyBuilder};
pub use sink::{LogFacade, NullLog, RetryEvent, RetryLog, TracingLog};
pub use tracing::Level;
