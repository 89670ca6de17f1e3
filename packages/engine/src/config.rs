//! Retry Configuration Module
//!
//! Data-only form of a retry policy, suitable for loading from
//! configuration files. Durations are expressed in seconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::ConfigError;
use crate::sink::parse_level;

/// Serializable retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt; absent means unbounded
    pub max_attempts: Option<u32>,
    /// Seconds after the first attempt past which no retry starts; absent means unbounded
    pub deadline_secs: Option<f64>,
    pub initial_delay_secs: f64,
    pub multiplier: f64,
    pub jitter: bool,
    pub reraise: bool,
    pub log_level: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            deadline_secs: None,
            initial_delay_secs: 1.0,
            multiplier: 2.0,
            jitter: true,
            reraise: false,
            log_level: "warn".to_string(),
        }
    }
}

impl RetryConfig {
    /// Single attempt, failures surface immediately
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: Some(0),
            initial_delay_secs: 0.0,
            ..Self::default()
        }
    }

    /// Constant, deterministic backoff
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay_secs: delay.as_secs_f64(),
            multiplier: 1.0,
            jitter: false,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed documents and the
    /// matching validation error for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate retry configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `multiplier` is not a positive finite number
    /// - a duration is negative, NaN or infinite
    /// - `log_level` is not a recognized level name
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(ConfigError::InvalidMultiplier(self.multiplier));
        }
        self.initial_delay()?;
        self.deadline()?;
        self.level()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDuration`] if the value is out of range.
    pub fn initial_delay(&self) -> Result<Duration, ConfigError> {
        seconds("initial_delay_secs", self.initial_delay_secs)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDuration`] if the value is out of range.
    pub fn deadline(&self) -> Result<Option<Duration>, ConfigError> {
        self.deadline_secs
            .map(|secs| seconds("deadline_secs", secs))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLogLevel`] for unrecognized names.
    pub fn level(&self) -> Result<Level, ConfigError> {
        parse_level(&self.log_level)
    }
}

fn seconds(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if value < 0.0 {
        return Err(ConfigError::InvalidDuration { field, value });
    }
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { field, value })
}
