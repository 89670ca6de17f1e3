//! Terminal methods of `RetryBuilder`: wrapping and one-shot calls

use std::fmt;
use std::future::Future;

use rebound_engine::{Blocking, ConfigError, Cooperative, Operation, RetryError, Retrying};

use super::fluent::RetryBuilder;

impl<E: 'static> RetryBuilder<E> {
    /// Wrap a blocking operation for repeated use
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] raised by any setting.
    pub fn wrap<F>(self, operation: F) -> Result<Retrying<F, E, Blocking>, ConfigError> {
        let name = self.name.clone();
        let retrying = Retrying::blocking(operation, self.policy()?);
        Ok(match name {
            Some(name) => retrying.named(name),
            None => retrying,
        })
    }

    /// Wrap an operation returning a future for repeated use
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] raised by any setting.
    pub fn wrap_async<F>(self, operation: F) -> Result<Retrying<F, E, Cooperative>, ConfigError> {
        let name = self.name.clone();
        let retrying = Retrying::cooperative(operation, self.policy()?);
        Ok(match name {
            Some(name) => retrying.named(name),
            None => retrying,
        })
    }

    /// Call a blocking operation once
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::InvalidPolicy`] if the settings are invalid,
    /// otherwise whatever the retry loop surfaces.
    pub fn call<F, A, T>(self, operation: F, args: A) -> Result<T, RetryError<E>>
    where
        F: Operation<A, Output = Result<T, E>>,
        A: Clone,
        E: fmt::Display + fmt::Debug,
    {
        self.wrap(operation)
            .map_err(RetryError::InvalidPolicy)?
            .call(args)
    }

    /// Await an async operation once
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::InvalidPolicy`] if the settings are invalid,
    /// otherwise whatever the retry loop surfaces.
    pub async fn call_async<F, A, T, Fut>(self, operation: F, args: A) -> Result<T, RetryError<E>>
    where
        F: Operation<A, Output = Fut>,
        Fut: Future<Output = Result<T, E>>,
        A: Clone,
        E: fmt::Display + fmt::Debug,
    {
        self.wrap_async(operation)
            .map_err(RetryError::InvalidPolicy)?
            .call(args)
            .await
    }
}
