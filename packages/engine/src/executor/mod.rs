//! Execution strategies for wrapped operations
//!
//! [`Retrying`] pairs an operation with an immutable [`RetryPolicy`]. The
//! mode parameter is fixed when the operation is wrapped:
//!
//! - [`Blocking`]: attempts and backoff sleeps occupy the calling thread
//! - [`Cooperative`]: attempts are awaited and backoff yields to the async
//!   runtime
//!
//! Both modes drive the same retry state machine; only invocation and
//! suspension differ.

mod blocking;
mod cooperative;
mod state;

use std::any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::policy::RetryPolicy;

/// Mode marker: attempts and sleeps block the calling thread
#[derive(Debug, Clone, Copy)]
pub struct Blocking;

/// Mode marker: attempts are awaited and sleeps yield to the runtime
#[derive(Debug, Clone, Copy)]
pub struct Cooperative;

/// Execution mode of a [`Retrying`] operation
pub trait Mode: sealed::Sealed {
    const NAME: &'static str;
}

impl Mode for Blocking {
    const NAME: &'static str = "blocking";
}

impl Mode for Cooperative {
    const NAME: &'static str = "cooperative";
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Blocking {}
    impl Sealed for super::Cooperative {}
}

/// An operation wrapped with retry logic
///
/// Each call builds fresh attempt state, so a single `Retrying` can be
/// shared between threads or tasks and called concurrently.
pub struct Retrying<F, E, M = Blocking> {
    operation: F,
    policy: Arc<RetryPolicy<E>>,
    name: Arc<str>,
    mode: PhantomData<fn() -> M>,
}

impl<F, E, M: Mode> Retrying<F, E, M> {
    fn with_mode(operation: F, policy: RetryPolicy<E>) -> Self {
        Self {
            operation,
            policy: Arc::new(policy),
            name: Arc::from(any::type_name::<F>()),
            mode: PhantomData,
        }
    }

    /// Override the name reported in retry records
    ///
    /// Defaults to the operation's type name.
    #[must_use]
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Name reported in retry records
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Policy shared by every call of this operation
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }

    /// The unwrapped operation
    #[inline]
    #[must_use]
    pub fn operation(&self) -> &F {
        &self.operation
    }

    /// Execution mode chosen at wrap time, `"blocking"` or `"cooperative"`
    #[inline]
    #[must_use]
    pub fn mode(&self) -> &'static str {
        M::NAME
    }
}

impl<F, E> Retrying<F, E, Blocking> {
    /// Wrap an operation that returns `Result` directly
    #[must_use]
    pub fn blocking(operation: F, policy: RetryPolicy<E>) -> Self {
        Self::with_mode(operation, policy)
    }
}

impl<F, E> Retrying<F, E, Cooperative> {
    /// Wrap an operation that returns a future of `Result`
    #[must_use]
    pub fn cooperative(operation: F, policy: RetryPolicy<E>) -> Self {
        Self::with_mode(operation, policy)
    }
}

impl<F: Clone, E, M> Clone for Retrying<F, E, M> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation.clone(),
            policy: Arc::clone(&self.policy),
            name: Arc::clone(&self.name),
            mode: PhantomData,
        }
    }
}

impl<F, E, M: Mode> fmt::Debug for Retrying<F, E, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrying")
            .field("name", &self.name)
            .field("mode", &M::NAME)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
