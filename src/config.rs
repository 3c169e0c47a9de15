//! Retry configuration loaded from JSON.
//!
//! Every field is optional; [`RetryConfig::into_builder`] only sets what is present, so the
//! builder still fills the rest with defaults at build time.
//!
//! ```rust
//! use sdk_core::config::RetryConfig;
//!
//! let config = RetryConfig::from_json(
//!     r#"{"num_retries": 5,
//!         "backoff": {"strategy": "equal_jitter", "base_delay_ms": 50},
//!         "retryable_status_codes": [503]}"#,
//! ).unwrap();
//! let policy = config.into_builder().unwrap().build().unwrap();
//! assert_eq!(policy.num_retries(), 5);
//! ```

use crate::backoff::{EqualJitterBackoff, FixedDelayBackoff, FullJitterBackoff};
use crate::condition::{OrCondition, RetryOnErrorCode, RetryOnErrorKind, RetryOnStatusCode};
use crate::defaults;
use crate::error::{BackoffError, ErrorKind};
use crate::retry::RetryPolicyBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors produced while loading a [`RetryConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid retry config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid backoff: {0}")]
    Backoff(#[from] BackoffError),
}

/// Partial retry policy settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    #[serde(default)]
    pub num_retries: Option<i32>,
    #[serde(default)]
    pub backoff: Option<BackoffConfig>,
    /// Retry on these HTTP status codes.
    #[serde(default)]
    pub retryable_status_codes: Option<Vec<u16>>,
    /// Retry on these service error codes.
    #[serde(default)]
    pub retryable_error_codes: Option<Vec<String>>,
    /// Retry on these error categories.
    #[serde(default)]
    pub retryable_error_kinds: Option<Vec<ErrorKind>>,
}

/// Backoff strategy selection. Unset delays take the defaults (100 ms base, 20 s cap).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BackoffConfig {
    Fixed {
        delay_ms: u64,
    },
    FullJitter {
        #[serde(default)]
        base_delay_ms: Option<u64>,
        #[serde(default)]
        max_backoff_ms: Option<u64>,
    },
    EqualJitter {
        #[serde(default)]
        base_delay_ms: Option<u64>,
        #[serde(default)]
        max_backoff_ms: Option<u64>,
    },
}

impl RetryConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// A builder carrying the configured fields.
    ///
    /// Jittered backoff is capped at the configured retry count, or the default count when
    /// none is configured. When any retryable list is present the condition is the OR of the
    /// present lists; otherwise the default condition applies.
    pub fn into_builder(self) -> Result<RetryPolicyBuilder, ConfigError> {
        let mut builder = RetryPolicyBuilder::new();
        if let Some(n) = self.num_retries {
            builder = builder.num_retries(n);
        }

        let doublings = self
            .num_retries
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(defaults::DEFAULT_NUM_RETRIES);
        match self.backoff {
            Some(BackoffConfig::Fixed { delay_ms }) => {
                builder = builder.backoff_strategy(FixedDelayBackoff::new(Duration::from_millis(delay_ms)));
            }
            Some(BackoffConfig::FullJitter { base_delay_ms, max_backoff_ms }) => {
                let (base, max) = delays(base_delay_ms, max_backoff_ms);
                builder = builder.backoff_strategy(FullJitterBackoff::new(base, max, doublings)?);
            }
            Some(BackoffConfig::EqualJitter { base_delay_ms, max_backoff_ms }) => {
                let (base, max) = delays(base_delay_ms, max_backoff_ms);
                builder = builder.backoff_strategy(EqualJitterBackoff::new(base, max, doublings)?);
            }
            None => {}
        }

        let mut condition = OrCondition::new();
        let mut any = false;
        if let Some(codes) = self.retryable_status_codes {
            condition = condition.or(RetryOnStatusCode::new(codes));
            any = true;
        }
        if let Some(codes) = self.retryable_error_codes {
            condition = condition.or(RetryOnErrorCode::new(codes));
            any = true;
        }
        if let Some(kinds) = self.retryable_error_kinds {
            condition = condition.or(RetryOnErrorKind::new(kinds));
            any = true;
        }
        if any {
            builder = builder.retry_condition(condition);
        }
        Ok(builder)
    }
}

fn delays(base_delay_ms: Option<u64>, max_backoff_ms: Option<u64>) -> (Duration, Duration) {
    (
        base_delay_ms.map(Duration::from_millis).unwrap_or(defaults::BASE_DELAY),
        max_backoff_ms.map(Duration::from_millis).unwrap_or(defaults::MAX_BACKOFF),
    )
}
