use std::fmt;
use std::future::Future;

use super::state::{RetryState, Verdict};
use super::{Cooperative, Retrying};
use crate::error::RetryError;
use crate::operation::Operation;

impl<F, E> Retrying<F, E, Cooperative> {
    /// Invoke the operation, retrying per the policy
    ///
    /// Backoff waits yield to the tokio runtime instead of blocking the
    /// worker. Dropping the returned future abandons the loop. A cancel
    /// token on the policy aborts both an in-flight attempt and the backoff
    /// wait.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Operation`] for non-retryable failures (and
    /// for the last failure when the policy re-raises),
    /// [`RetryError::Exhausted`] when a limit is hit, and
    /// [`RetryError::Cancelled`] when the policy's token is cancelled.
    pub async fn call<A, T, Fut>(&self, args: A) -> Result<T, RetryError<E>>
    where
        F: Operation<A, Output = Fut>,
        Fut: Future<Output = Result<T, E>>,
        A: Clone,
        E: fmt::Display + fmt::Debug,
    {
        let mut state = RetryState::start(&self.policy, &self.name);
        let token = self.policy.cancel_token();
        loop {
            if state.is_cancelled() {
                return Err(state.cancelled(None));
            }

            let attempt = self.operation.invoke(args.clone());
            let outcome = match token {
                Some(token) => tokio::select! {
                    biased;
                    () = token.cancelled() => return Err(state.cancelled(None)),
                    outcome = attempt => outcome,
                },
                None => attempt.await,
            };

            let error = match outcome {
                Ok(value) => return state.succeeded(value),
                Err(error) => error,
            };

            match state.failed(error) {
                Verdict::Retry(delay) => match token {
                    Some(token) => tokio::select! {
                        biased;
                        () = token.cancelled() => return Err(state.cancelled(None)),
                        () = tokio::time::sleep(delay) => {}
                    },
                    None => tokio::time::sleep(delay).await,
                },
                Verdict::Stop(error) => return Err(error),
            }
        }
    }
}
