//! Shared fixtures for retry engine integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rebound_engine::{Classifier, Level, RetryEvent, RetryLog, RetryPolicy, RetryPolicyBuilder};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestError {
    #[error("transient failure on attempt {0}")]
    Transient(u32),
    #[error("fatal failure on attempt {0}")]
    Fatal(u32),
}

impl TestError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TestError::Transient(_))
    }
}

/// One captured retry record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub level: Level,
    pub operation: String,
    pub attempt: u32,
    pub delay: Duration,
    pub error: String,
}

/// Sink that keeps every record in memory
#[derive(Debug, Default)]
pub struct RecordingLog {
    records: Mutex<Vec<Record>>,
}

impl RecordingLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.records().into_iter().map(|r| r.delay).collect()
    }

    pub fn attempts(&self) -> Vec<u32> {
        self.records().into_iter().map(|r| r.attempt).collect()
    }
}

impl RetryLog for RecordingLog {
    fn log(&self, level: Level, event: &RetryEvent<'_>) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Record {
                level,
                operation: event.operation.to_string(),
                attempt: event.attempt,
                delay: event.delay,
                error: event.error.to_string(),
            });
    }
}

/// Deterministic policy retrying `TestError::Transient`
pub fn transient_policy(log: &Arc<RecordingLog>) -> RetryPolicyBuilder<TestError> {
    RetryPolicy::builder(Classifier::when(TestError::is_transient))
        .initial_delay(Duration::from_millis(10))
        .multiplier(2.0)
        .jitter(false)
        .log_sink(log.clone())
}

pub fn ms(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_millis).collect()
}
