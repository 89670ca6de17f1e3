//! Convenience functions for common retry scenarios
//!
//! Thin wrappers over [`Retrying`] for callers that do not need to keep the
//! wrapped operation around.

use std::fmt;
use std::future::Future;

use crate::error::RetryError;
use crate::executor::{Blocking, Cooperative, Retrying};
use crate::operation::Operation;
use crate::policy::RetryPolicy;

/// Wrap a blocking operation
#[inline]
pub fn wrap<F, E>(operation: F, policy: RetryPolicy<E>) -> Retrying<F, E, Blocking> {
    Retrying::blocking(operation, policy)
}

/// Wrap an operation returning a future
#[inline]
pub fn wrap_async<F, E>(operation: F, policy: RetryPolicy<E>) -> Retrying<F, E, Cooperative> {
    Retrying::cooperative(operation, policy)
}

/// Call a blocking operation once with retry logic
///
/// # Errors
///
/// See [`Retrying::call`](crate::Retrying).
pub fn retry<F, A, T, E>(operation: F, args: A, policy: RetryPolicy<E>) -> Result<T, RetryError<E>>
where
    F: Operation<A, Output = Result<T, E>>,
    A: Clone,
    E: fmt::Display + fmt::Debug,
{
    wrap(operation, policy).call(args)
}

/// Await an async operation once with retry logic
///
/// # Errors
///
/// See [`Retrying::call`](crate::Retrying).
pub async fn retry_async<F, A, T, E, Fut>(
    operation: F,
    args: A,
    policy: RetryPolicy<E>,
) -> Result<T, RetryError<E>>
where
    F: Operation<A, Output = Fut>,
    Fut: Future<Output = Result<T, E>>,
    A: Clone,
    E: fmt::Display + fmt::Debug,
{
    wrap_async(operation, policy).call(args).await
}
