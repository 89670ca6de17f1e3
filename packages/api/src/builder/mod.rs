//! Fluent retry builder
//!
//! Start from [`Retry`], chain policy settings, then either wrap an
//! operation for repeated use or call it once.

pub mod execution;
pub mod fluent;

pub use fluent::{Retry, RetryBuilder};
