//! Retry policy configuration
//!
//! A [`RetryPolicy`] is immutable once built. It decides which failures
//! are retried, how long to back off between attempts, when to give up, and
//! where retried attempts are reported.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::Level;

use crate::backoff::Backoff;
use crate::cancel::CancelToken;
use crate::config::RetryConfig;
use crate::error::ConfigError;
use crate::counters::RetryCounters;
use crate::sink::{self, RetryLog};

/// Boxed dynamic error, the usual failure type of heterogeneous operations
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Decides whether a failure is worth retrying
pub struct Classifier<E> {
    predicate: Arc<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E> Clone for Classifier<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<E> fmt::Debug for Classifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Classifier(..)")
    }
}

impl<E: 'static> Classifier<E> {
    /// Retry failures for which `predicate` returns true
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Retry every failure
    #[must_use]
    pub fn always() -> Self {
        Self::when(|_| true)
    }

    /// Retry nothing; every failure propagates on first sight
    #[must_use]
    pub fn never() -> Self {
        Self::when(|_| false)
    }

    /// Retry failures matched by either classifier
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::when(move |error| self.matches(error) || other.matches(error))
    }
}

impl<E> Classifier<E> {
    #[inline]
    pub fn matches(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}

impl Classifier<BoxError> {
    /// Retry boxed failures whose concrete type is `T`
    ///
    /// Chain several with [`Classifier::or`] to retry a set of error types.
    #[must_use]
    pub fn of_type<T>() -> Self
    where
        T: StdError + 'static,
    {
        Self::when(|error: &BoxError| (**error).is::<T>())
    }
}

/// Immutable retry policy
///
/// Built through [`RetryPolicy::builder`] or [`RetryPolicy::from_config`].
pub struct RetryPolicy<E> {
    classifier: Classifier<E>,
    max_attempts: Option<u32>,
    deadline: Option<Duration>,
    backoff: Backoff,
    reraise: bool,
    log_level: Level,
    log_sink: Arc<dyn RetryLog>,
    cancel: Option<CancelToken>,
    counters: Option<Arc<RetryCounters>>,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            classifier: self.classifier.clone(),
            max_attempts: self.max_attempts,
            deadline: self.deadline,
            backoff: self.backoff,
            reraise: self.reraise,
            log_level: self.log_level,
            log_sink: Arc::clone(&self.log_sink),
            cancel: self.cancel.clone(),
            counters: self.counters.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("deadline", &self.deadline)
            .field("backoff", &self.backoff)
            .field("reraise", &self.reraise)
            .field("log_level", &self.log_level)
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: 'static> RetryPolicy<E> {
    /// Start building a policy that retries failures matched by `classifier`
    pub fn builder(classifier: Classifier<E>) -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::new(classifier)
    }

    /// Build a policy from its data-only form
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any field of `config` is invalid.
    pub fn from_config(config: &RetryConfig, classifier: Classifier<E>) -> Result<Self, ConfigError> {
        Self::builder(classifier).config(config)?.build()
    }
}

impl<E> RetryPolicy<E> {
    /// Whether `error` qualifies for another attempt
    ///
    /// Only the classifier is consulted; attempt and deadline limits are
    /// applied per call by the retry loop.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self, error: &E) -> bool {
        self.classifier.matches(error)
    }

    /// Predicate selecting retryable failures
    #[inline]
    #[must_use]
    pub fn classifier(&self) -> &Classifier<E> {
        &self.classifier
    }

    /// Retries allowed after the first attempt; `None` is unbounded
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Time after the first attempt past which no retry is started
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Delay schedule between attempts
    ///
    /// Read-only; every call derives its own [`AttemptState`](crate::AttemptState)
    /// from it.
    #[inline]
    #[must_use]
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Whether exhaustion surfaces the last failure as
    /// [`RetryError::Operation`](crate::RetryError::Operation) instead of
    /// [`RetryError::Exhausted`](crate::RetryError::Exhausted)
    #[inline]
    #[must_use]
    pub fn reraise(&self) -> bool {
        self.reraise
    }

    /// Level of the record emitted for each retried attempt
    #[inline]
    #[must_use]
    pub fn log_level(&self) -> Level {
        self.log_level
    }

    /// Destination of retry records
    ///
    /// Policies built without an explicit sink hold the process-wide
    /// default captured when the builder was created.
    #[inline]
    #[must_use]
    pub fn log_sink(&self) -> &dyn RetryLog {
        self.log_sink.as_ref()
    }

    /// Token that stops every call made under this policy
    #[inline]
    #[must_use]
    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    /// Outcome counters, if the policy was built with some
    #[inline]
    #[must_use]
    pub fn counters(&self) -> Option<&RetryCounters> {
        self.counters.as_deref()
    }
}

/// Fluent builder for [`RetryPolicy`]
///
/// Defaults: unbounded retries, no deadline, 1 second initial delay,
/// multiplier 2, jitter on, no re-raise, `WARN` level, process-wide sink.
pub struct RetryPolicyBuilder<E> {
    policy: RetryPolicy<E>,
}

impl<E> fmt::Debug for RetryPolicyBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RetryPolicyBuilder").field(&self.policy).finish()
    }
}

impl<E: 'static> RetryPolicyBuilder<E> {
    #[must_use]
    pub fn new(classifier: Classifier<E>) -> Self {
        Self {
            policy: RetryPolicy {
                classifier,
                max_attempts: None,
                deadline: None,
                backoff: Backoff::default(),
                reraise: false,
                log_level: Level::WARN,
                log_sink: sink::default_sink(),
                cancel: None,
                counters: None,
            },
        }
    }

    /// Replace the classifier
    #[must_use]
    pub fn retry_on(mut self, classifier: Classifier<E>) -> Self {
        self.policy.classifier = classifier;
        self
    }

    /// Also retry failures matched by `classifier`
    #[must_use]
    pub fn or_retry_on(mut self, classifier: Classifier<E>) -> Self {
        self.policy.classifier = self.policy.classifier.or(classifier);
        self
    }

    /// Allow at most `retries` retries, i.e. `retries + 1` invocations
    #[must_use]
    pub fn max_attempts(mut self, retries: u32) -> Self {
        self.policy.max_attempts = Some(retries);
        self
    }

    #[must_use]
    pub fn unbounded_attempts(mut self) -> Self {
        self.policy.max_attempts = None;
        self
    }

    /// Refuse to schedule a retry that would start later than `deadline`
    /// after the first attempt
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.policy.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn no_deadline(mut self) -> Self {
        self.policy.deadline = None;
        self
    }

    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.backoff.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn multiplier(mut self, factor: f64) -> Self {
        self.policy.backoff.multiplier = factor;
        self
    }

    #[must_use]
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.policy.backoff.jitter = enabled;
        self
    }

    /// On exhaustion, return the last failure itself instead of
    /// [`RetryError::Exhausted`](crate::RetryError::Exhausted)
    #[must_use]
    pub fn reraise(mut self, enabled: bool) -> Self {
        self.policy.reraise = enabled;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: Level) -> Self {
        self.policy.log_level = level;
        self
    }

    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn RetryLog>) -> Self {
        self.policy.log_sink = sink;
        self
    }

    #[must_use]
    pub fn cancel_on(mut self, token: CancelToken) -> Self {
        self.policy.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn counters(mut self, counters: Arc<RetryCounters>) -> Self {
        self.policy.counters = Some(counters);
        self
    }

    /// Apply every field of a data-only configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any field of `config` is invalid.
    pub fn config(mut self, config: &RetryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.policy.max_attempts = config.max_attempts;
        self.policy.deadline = config.deadline()?;
        self.policy.backoff = Backoff {
            initial_delay: config.initial_delay()?,
            multiplier: config.multiplier,
            jitter: config.jitter,
        };
        self.policy.reraise = config.reraise;
        self.policy.log_level = config.level()?;
        Ok(self)
    }

    /// Validate and freeze the policy
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMultiplier`] unless the multiplier is
    /// a positive finite number.
    pub fn build(self) -> Result<RetryPolicy<E>, ConfigError> {
        let multiplier = self.policy.backoff.multiplier;
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(ConfigError::InvalidMultiplier(multiplier));
        }
        Ok(self.policy)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::sink::NullLog;

    #[derive(Debug, thiserror::Error)]
    #[error("transient")]
    struct Transient;

    #[test]
    fn defaults_match_documented_values() {
        let policy = RetryPolicy::<io::Error>::builder(Classifier::always())
            .build()
            .unwrap();
        assert_eq!(policy.max_attempts(), None);
        assert_eq!(policy.deadline(), None);
        assert_eq!(policy.backoff().initial_delay, Duration::from_secs(1));
        assert!((policy.backoff().multiplier - 2.0).abs() < f64::EPSILON);
        assert!(policy.backoff().jitter);
        assert!(!policy.reraise());
        assert_eq!(policy.log_level(), Level::WARN);
        assert!(policy.cancel_token().is_none());
    }

    #[test]
    fn rejects_non_positive_or_non_finite_multiplier() {
        for factor in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            let result = RetryPolicy::<io::Error>::builder(Classifier::always())
                .multiplier(factor)
                .build();
            assert!(matches!(result, Err(ConfigError::InvalidMultiplier(_))));
        }
    }

    #[test]
    fn classifier_combinators() {
        let timeouts = Classifier::when(|e: &io::Error| e.kind() == io::ErrorKind::TimedOut);
        let resets = Classifier::when(|e: &io::Error| e.kind() == io::ErrorKind::ConnectionReset);
        let either = timeouts.or(resets);

        assert!(either.matches(&io::Error::from(io::ErrorKind::TimedOut)));
        assert!(either.matches(&io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(!either.matches(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(!Classifier::<io::Error>::never().matches(&io::Error::from(io::ErrorKind::TimedOut)));
    }

    #[test]
    fn of_type_matches_boxed_error_types() {
        let classifier = Classifier::of_type::<Transient>();
        let transient: BoxError = Box::new(Transient);
        let other: BoxError = Box::new(io::Error::other("nope"));
        assert!(classifier.matches(&transient));
        assert!(!classifier.matches(&other));

        let set = Classifier::of_type::<Transient>().or(Classifier::of_type::<io::Error>());
        assert!(set.matches(&other));
    }

    #[test]
    fn config_is_applied_field_by_field() {
        let config = RetryConfig {
            max_attempts: Some(4),
            deadline_secs: Some(2.5),
            initial_delay_secs: 0.25,
            multiplier: 3.0,
            jitter: false,
            reraise: true,
            log_level: "info".to_string(),
        };
        let policy = RetryPolicy::<io::Error>::builder(Classifier::always())
            .log_sink(Arc::new(NullLog))
            .config(&config)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(policy.max_attempts(), Some(4));
        assert_eq!(policy.deadline(), Some(Duration::from_millis(2500)));
        assert_eq!(policy.backoff().initial_delay, Duration::from_millis(250));
        assert!(!policy.backoff().jitter);
        assert!(policy.reraise());
        assert_eq!(policy.log_level(), Level::INFO);
    }

    #[test]
    fn from_config_rejects_invalid_settings() {
        let config = RetryConfig {
            multiplier: -2.0,
            ..RetryConfig::default()
        };
        assert!(RetryPolicy::<io::Error>::from_config(&config, Classifier::always()).is_err());

        let policy =
            RetryPolicy::<io::Error>::from_config(&RetryConfig::no_retry(), Classifier::always())
                .unwrap();
        assert_eq!(policy.max_attempts(), Some(0));
    }
}
