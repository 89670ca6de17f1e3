//! Retry state machine shared by both execution modes

use std::fmt;
use std::time::Duration;

use crate::backoff::AttemptState;
use crate::counters::Outcome;
use crate::error::{Limit, RetryError};
use crate::policy::RetryPolicy;
use crate::sink::RetryEvent;

/// What the loop does after a failed attempt
pub(super) enum Verdict<E> {
    /// Wait this long, then invoke the operation again
    Retry(Duration),
    /// Stop and surface this error
    Stop(RetryError<E>),
}

/// Per-call state: created when a call starts, dropped when it returns
pub(super) struct RetryState<'a, E> {
    policy: &'a RetryPolicy<E>,
    name: &'a str,
    attempt: AttemptState,
}

impl<'a, E> RetryState<'a, E>
where
    E: fmt::Display + fmt::Debug,
{
    pub(super) fn start(policy: &'a RetryPolicy<E>, name: &'a str) -> Self {
        if let Some(counters) = policy.counters() {
            counters.call_started();
        }
        Self {
            policy,
            name,
            attempt: AttemptState::start(policy.backoff(), policy.deadline()),
        }
    }

    #[inline]
    pub(super) fn is_cancelled(&self) -> bool {
        self.policy
            .cancel_token()
            .is_some_and(crate::CancelToken::is_cancelled)
    }

    pub(super) fn succeeded<T>(&self, value: T) -> Result<T, RetryError<E>> {
        self.finish(Outcome::Succeeded);
        Ok(value)
    }

    /// Classify a failed attempt and decide whether to retry
    ///
    /// Non-retryable failures pass through untouched even when the call
    /// has been cancelled; cancellation only prevents scheduling a retry.
    pub(super) fn failed(&mut self, error: E) -> Verdict<E> {
        if !self.policy.is_retryable(&error) {
            self.finish(Outcome::Rejected);
            return Verdict::Stop(RetryError::Operation(error));
        }

        if self.is_cancelled() {
            return Verdict::Stop(self.cancelled(Some(error)));
        }

        if let Some(max) = self.policy.max_attempts() {
            if self.attempt.attempt() >= max {
                return Verdict::Stop(self.exhausted(Limit::Attempts(max), error));
            }
        }

        let delay = self.attempt.next_delay(self.policy.backoff());

        if let Some(deadline) = self.policy.deadline() {
            if self.attempt.overshoots_deadline(delay) {
                return Verdict::Stop(self.exhausted(Limit::Deadline(deadline), error));
            }
        }

        self.policy.log_sink().log(
            self.policy.log_level(),
            &RetryEvent {
                operation: self.name,
                attempt: self.attempt.attempt().saturating_add(1),
                delay,
                elapsed: self.attempt.elapsed(),
                error: &error,
                detail: &error,
            },
        );

        self.attempt.advance();
        if let Some(counters) = self.policy.counters() {
            counters.retry_scheduled();
        }
        Verdict::Retry(delay)
    }

    /// Build the error for a call stopped by its cancel token
    pub(super) fn cancelled(&self, last: Option<E>) -> RetryError<E> {
        self.finish(Outcome::Cancelled);
        RetryError::Cancelled { last }
    }

    fn exhausted(&self, limit: Limit, error: E) -> RetryError<E> {
        self.finish(Outcome::Exhausted(limit));
        if self.policy.reraise() {
            RetryError::Operation(error)
        } else {
            RetryError::Exhausted {
                limit,
                attempts: self.attempt.attempt().saturating_add(1),
                elapsed: self.attempt.elapsed(),
                source: error,
            }
        }
    }

    fn finish(&self, outcome: Outcome) {
        if let Some(counters) = self.policy.counters() {
            counters.call_finished(outcome);
        }
    }
}
