//! Retry log sinks
//!
//! Every retried attempt produces exactly one [`RetryEvent`], delivered to
//! the policy's [`RetryLog`] at the policy's level. The final success and
//! the terminal failure are never logged through the sink.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::Level;

use crate::error::ConfigError;

/// Target used for every record emitted by this crate
pub const LOG_TARGET: &str = "rebound";

/// A retried attempt, as reported to a [`RetryLog`]
pub struct RetryEvent<'a> {
    /// Name of the wrapped operation
    pub operation: &'a str,
    /// 1-based number of the attempt that failed
    pub attempt: u32,
    /// Time the loop will wait before the next attempt
    pub delay: Duration,
    /// Time since the first attempt started
    pub elapsed: Duration,
    /// The failure that triggered the retry
    pub error: &'a dyn fmt::Display,
    /// Debug rendering of the failure, including any source chain or backtrace
    pub detail: &'a dyn fmt::Debug,
}

impl RetryEvent<'_> {
    /// Human-readable summary line
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "{} failed on try {}, retrying in {:?}: {}",
            self.operation, self.attempt, self.delay, self.error
        )
    }

    /// Delay in whole milliseconds, saturating
    #[must_use]
    pub fn delay_ms(&self) -> u64 {
        u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX)
    }
}

impl fmt::Debug for RetryEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryEvent")
            .field("operation", &self.operation)
            .field("attempt", &self.attempt)
            .field("delay", &self.delay)
            .field("elapsed", &self.elapsed)
            .field("error", &format_args!("{}", self.error))
            .finish()
    }
}

/// Destination for retry records
///
/// Implementations must tolerate concurrent calls from many in-flight
/// retry loops.
pub trait RetryLog: Send + Sync {
    fn log(&self, level: Level, event: &RetryEvent<'_>);
}

impl<T: RetryLog + ?Sized> RetryLog for Arc<T> {
    fn log(&self, level: Level, event: &RetryEvent<'_>) {
        (**self).log(level, event);
    }
}

/// Emits structured `tracing` events under [`LOG_TARGET`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl RetryLog for TracingLog {
    fn log(&self, level: Level, event: &RetryEvent<'_>) {
        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(
                    target: LOG_TARGET,
                    $level,
                    operation = event.operation,
                    attempt = event.attempt,
                    delay_ms = event.delay_ms(),
                    error = %event.error,
                    detail = ?event.detail,
                    "{}",
                    event.message()
                )
            };
        }

        match level {
            Level::ERROR => emit!(Level::ERROR),
            Level::WARN => emit!(Level::WARN),
            Level::INFO => emit!(Level::INFO),
            Level::DEBUG => emit!(Level::DEBUG),
            _ => emit!(Level::TRACE),
        }
    }
}

/// Forwards records to the `log` crate facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl RetryLog for LogFacade {
    fn log(&self, level: Level, event: &RetryEvent<'_>) {
        ::log::log!(
            target: LOG_TARGET,
            as_log_level(level),
            "{}\n{:?}",
            event.message(),
            event.detail
        );
    }
}

/// Discards every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl RetryLog for NullLog {
    fn log(&self, _level: Level, _event: &RetryEvent<'_>) {}
}

fn as_log_level(level: Level) -> ::log::Level {
    match level {
        Level::ERROR => ::log::Level::Error,
        Level::WARN => ::log::Level::Warn,
        Level::INFO => ::log::Level::Info,
        Level::DEBUG => ::log::Level::Debug,
        _ => ::log::Level::Trace,
    }
}

/// Parse a level name such as `"warn"`, `"warning"` or `"INFO"`
///
/// # Errors
///
/// Returns [`ConfigError::UnknownLogLevel`] for unrecognized names.
pub fn parse_level(name: &str) -> Result<Level, ConfigError> {
    if name.eq_ignore_ascii_case("warning") {
        return Ok(Level::WARN);
    }
    name.parse::<Level>()
        .map_err(|_| ConfigError::UnknownLogLevel(name.to_string()))
}

static DEFAULT_SINK: OnceLock<Arc<dyn RetryLog>> = OnceLock::new();

/// Process-wide sink used by policies built without an explicit one
///
/// Initialized to [`TracingLog`] on first use unless [`install_default`]
/// ran earlier.
pub fn default_sink() -> Arc<dyn RetryLog> {
    Arc::clone(DEFAULT_SINK.get_or_init(|| Arc::new(TracingLog)))
}

/// Replace the process-wide default sink
///
/// Must run at startup, before any policy picks up the default.
///
/// # Errors
///
/// Hands the sink back if a default is already in place.
pub fn install_default(sink: Arc<dyn RetryLog>) -> Result<(), Arc<dyn RetryLog>> {
    DEFAULT_SINK.set(sink)
}
