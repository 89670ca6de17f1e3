//! Rebound public API
//!
//! Retry blocking or async operations with exponential backoff, optional
//! jitter, a retry limit and a deadline, without hand-written retry loops.
//!
//! ```no_run
//! use std::io;
//! use std::time::Duration;
//!
//! use rebound::Retry;
//!
//! fn fetch(id: u32) -> io::Result<String> {
//!     Ok(format!("record {id}"))
//! }
//!
//! let fetch = Retry::when(|e: &io::Error| e.kind() == io::ErrorKind::TimedOut)
//!     .max_attempts(3)
//!     .initial_delay(Duration::from_millis(100))
//!     .wrap(fetch)
//!     .expect("valid policy");
//!
//! let record = fetch.call((7,));
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;

// Re-export all public API components
pub use builder::{Retry, RetryBuilder};

// Re-export the engine surface
pub use rebound_engine::{
    Backoff, Blocking, BoxError, CancelToken, Classifier, ConfigError, Cooperative,
    CounterSnapshot, Level, Limit, LogFacade, Mode, NullLog, Operation, RetryConfig,
    RetryCounters, RetryError, RetryEvent, RetryLog, RetryPolicy, RetryPolicyBuilder, Retrying,
    TracingLog, retry, retry_async, wrap, wrap_async,
};

/// Log sinks and the process-wide default sink
pub mod sink {
    pub use rebound_engine::sink::{
        LOG_TARGET, LogFacade, NullLog, RetryEvent, RetryLog, TracingLog, default_sink,
        install_default, parse_level,
    };
}
