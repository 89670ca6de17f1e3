//! Core `RetryBuilder` structures and policy settings

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rebound_engine::{
    BoxError, CancelToken, Classifier, ConfigError, RetryConfig, RetryCounters, RetryLog,
    RetryPolicy, RetryPolicyBuilder,
};
use tracing::Level;

/// Entry point providing static builder constructors
pub struct Retry;

impl Retry {
    /// Retry failures matched by `classifier`
    #[must_use]
    pub fn on<E: 'static>(classifier: Classifier<E>) -> RetryBuilder<E> {
        RetryBuilder::new(classifier)
    }

    /// Retry failures for which `predicate` returns true
    #[must_use]
    pub fn when<E, F>(predicate: F) -> RetryBuilder<E>
    where
        E: 'static,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        RetryBuilder::new(Classifier::when(predicate))
    }

    /// Retry every failure
    #[must_use]
    pub fn always<E: 'static>() -> RetryBuilder<E> {
        RetryBuilder::new(Classifier::always())
    }

    /// Retry boxed failures whose concrete type is `T`
    ///
    /// Extend the set with [`RetryBuilder::or_type`].
    #[must_use]
    pub fn errors_of<T>() -> RetryBuilder<BoxError>
    where
        T: StdError + 'static,
    {
        RetryBuilder::new(Classifier::<BoxError>::of_type::<T>())
    }
}

/// Fluent builder over a retry policy
///
/// Invalid settings are reported when the policy is finally built, by
/// [`RetryBuilder::policy`], `wrap`, `wrap_async`, `call` or `call_async`.
pub struct RetryBuilder<E> {
    pub(crate) inner: Result<RetryPolicyBuilder<E>, ConfigError>,
    pub(crate) name: Option<Arc<str>>,
}

impl<E> fmt::Debug for RetryBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryBuilder")
            .field("inner", &self.inner)
            .field("name", &self.name)
            .finish()
    }
}

impl<E: 'static> RetryBuilder<E> {
    /// Start from the default policy with `classifier` selecting retryable failures
    #[must_use]
    pub fn new(classifier: Classifier<E>) -> Self {
        Self {
            inner: Ok(RetryPolicy::builder(classifier)),
            name: None,
        }
    }

    fn map(self, f: impl FnOnce(RetryPolicyBuilder<E>) -> RetryPolicyBuilder<E>) -> Self {
        Self {
            inner: self.inner.map(f),
            name: self.name,
        }
    }

    /// Number of retries after the first attempt
    #[must_use]
    pub fn max_attempts(self, retries: u32) -> Self {
        self.map(|b| b.max_attempts(retries))
    }

    /// Stop scheduling retries once this much time has passed since the first attempt
    ///
    /// An attempt already running is never interrupted.
    #[must_use]
    pub fn deadline(self, deadline: Duration) -> Self {
        self.map(|b| b.deadline(deadline))
    }

    /// Wait before the first retry
    #[must_use]
    pub fn initial_delay(self, delay: Duration) -> Self {
        self.map(|b| b.initial_delay(delay))
    }

    /// Growth factor of the un-jittered delay after each retry
    ///
    /// Must be finite and positive; `1.0` gives a constant delay.
    #[must_use]
    pub fn multiplier(self, factor: f64) -> Self {
        self.map(|b| b.multiplier(factor))
    }

    /// Sleep a uniform random fraction of each delay
    #[must_use]
    pub fn jitter(self, enabled: bool) -> Self {
        self.map(|b| b.jitter(enabled))
    }

    /// Surface the last failure itself on exhaustion
    #[must_use]
    pub fn reraise(self, enabled: bool) -> Self {
        self.map(|b| b.reraise(enabled))
    }

    #[must_use]
    pub fn log_level(self, level: Level) -> Self {
        self.map(|b| b.log_level(level))
    }

    #[must_use]
    pub fn log_sink(self, sink: Arc<dyn RetryLog>) -> Self {
        self.map(|b| b.log_sink(sink))
    }

    /// Stop calls when `token` is cancelled
    #[must_use]
    pub fn cancel_on(self, token: CancelToken) -> Self {
        self.map(|b| b.cancel_on(token))
    }

    /// Record call outcomes into `counters`
    #[must_use]
    pub fn counters(self, counters: Arc<RetryCounters>) -> Self {
        self.map(|b| b.counters(counters))
    }

    /// Apply a data-only configuration on top of the current settings
    #[must_use]
    pub fn config(self, config: &RetryConfig) -> Self {
        Self {
            inner: self.inner.and_then(|b| b.config(config)),
            name: self.name,
        }
    }

    /// Name reported in retry records for the wrapped operation
    #[must_use]
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validate and freeze the policy
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] raised by any setting.
    pub fn policy(self) -> Result<RetryPolicy<E>, ConfigError> {
        self.inner?.build()
    }
}

impl RetryBuilder<BoxError> {
    /// Also retry boxed failures whose concrete type is `T`
    #[must_use]
    pub fn or_type<T>(self) -> Self
    where
        T: StdError + 'static,
    {
        self.map(|b| b.or_retry_on(Classifier::<BoxError>::of_type::<T>()))
    }
}
