use std::fmt;
use std::thread;
use std::time::Duration;

use super::state::{RetryState, Verdict};
use super::{Blocking, Retrying};
use crate::cancel::CancelToken;
use crate::error::RetryError;
use crate::operation::Operation;

impl<F, E> Retrying<F, E, Blocking> {
    /// Invoke the operation, retrying per the policy
    ///
    /// The calling thread is occupied for the whole call, backoff sleeps
    /// included. A cancel token on the policy interrupts the sleep but
    /// never an attempt in progress.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Operation`] for non-retryable failures (and
    /// for the last failure when the policy re-raises),
    /// [`RetryError::Exhausted`] when a limit is hit, and
    /// [`RetryError::Cancelled`] when the policy's token is cancelled.
    pub fn call<A, T>(&self, args: A) -> Result<T, RetryError<E>>
    where
        F: Operation<A, Output = Result<T, E>>,
        A: Clone,
        E: fmt::Display + fmt::Debug,
    {
        let mut state = RetryState::start(&self.policy, &self.name);
        loop {
            if state.is_cancelled() {
                return Err(state.cancelled(None));
            }

            let error = match self.operation.invoke(args.clone()) {
                Ok(value) => return state.succeeded(value),
                Err(error) => error,
            };

            match state.failed(error) {
                Verdict::Retry(delay) => {
                    if !suspend(self.policy.cancel_token(), delay) {
                        return Err(state.cancelled(None));
                    }
                }
                Verdict::Stop(error) => return Err(error),
            }
        }
    }
}

/// Block for `delay`; returns `false` if cancelled first
fn suspend(token: Option<&CancelToken>, delay: Duration) -> bool {
    match token {
        Some(token) => token.sleep_blocking(delay),
        None => {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            true
        }
    }
}
