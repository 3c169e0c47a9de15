//! Retry policy: one backoff strategy plus one retry condition, capped by a retry ceiling.
//!
//! Semantics:
//! - `num_retries` counts retries only; the initial attempt is not included.
//! - The effective condition is always `AND(MaxNumberOfRetries(num_retries), condition)`. The
//!   composition happens once, when the policy is built, so a custom condition never needs to
//!   restate the ceiling and cannot bypass it.
//! - The backoff strategy is consulted only after a retry has been granted.
//! - Unset builder fields are filled with defaults at build time: 3 retries, full-jitter backoff
//!   (100 ms base, 20 s cap, capped at `num_retries` doublings), and [`default_condition`].
//!
//! Policies are immutable and cheap to clone; retry counters live in the executing loop, never
//! in the policy, so one policy can serve any number of concurrent requests.
//!
//! Example
//! ```rust
//! use sdk_core::{AttemptContext, RetryPolicy, SdkError};
//!
//! let policy = RetryPolicy::standard().to_builder().num_retries(5).build().unwrap();
//! assert_eq!(policy.num_retries(), 5);
//!
//! let err = SdkError::service(503, "ServiceUnavailable", "try again");
//! assert!(policy.should_retry(&AttemptContext::new(4).with_error(&err)));
//! assert!(!policy.should_retry(&AttemptContext::new(5).with_error(&err)));
//! ```

use crate::backoff::{BackoffStrategy, FixedDelayBackoff, FullJitterBackoff};
use crate::condition::{default_condition, AndCondition, MaxNumberOfRetries, NeverRetry, RetryCondition};
use crate::context::AttemptContext;
use crate::defaults;
use crate::error::BuildError;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Immutable retry configuration consumed by the request executor.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    num_retries: u32,
    backoff: Arc<dyn BackoffStrategy>,
    condition: Arc<dyn RetryCondition>,
    effective: AndCondition,
}

impl RetryPolicy {
    /// Construct a new builder; every field starts unset.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// Shared standard policy: 3 retries, full-jitter backoff, and the default condition
    /// (retryable status codes, throttling and clock-skew error codes, retryable/I/O errors).
    pub fn standard() -> &'static RetryPolicy {
        static STANDARD: OnceLock<RetryPolicy> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let num_retries = defaults::DEFAULT_NUM_RETRIES;
            RetryPolicy::assemble(
                num_retries,
                Arc::new(FullJitterBackoff::with_defaults(num_retries)),
                Arc::new(default_condition()),
            )
        })
    }

    /// Shared policy that never retries. Its backoff is a nominal 1 ms fixed delay.
    pub fn none() -> &'static RetryPolicy {
        static NONE: OnceLock<RetryPolicy> = OnceLock::new();
        NONE.get_or_init(|| {
            RetryPolicy::assemble(
                defaults::DEFAULT_NUM_RETRIES,
                Arc::new(FixedDelayBackoff::new(defaults::NO_RETRY_DELAY)),
                Arc::new(NeverRetry),
            )
        })
    }

    fn assemble(
        num_retries: u32,
        backoff: Arc<dyn BackoffStrategy>,
        condition: Arc<dyn RetryCondition>,
    ) -> Self {
        let effective = AndCondition::new()
            .and(MaxNumberOfRetries::new(num_retries))
            .and(condition.clone());
        Self { num_retries, backoff, condition, effective }
    }

    /// Whether another attempt is permitted after the failure described by `ctx`.
    pub fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool {
        self.effective.should_retry(ctx)
    }

    /// Delay before the next attempt. Only meaningful once `should_retry` returned true.
    pub fn compute_delay_before_next_retry(&self, ctx: &AttemptContext<'_>) -> Duration {
        self.backoff.compute_delay_before_next_retry(ctx)
    }

    /// Builder pre-populated with this policy's settings. Building from it never affects `self`.
    pub fn to_builder(&self) -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            num_retries: Some(self.num_retries as i32),
            backoff: Some(self.backoff.clone()),
            condition: Some(self.condition.clone()),
        }
    }

    pub fn num_retries(&self) -> u32 {
        self.num_retries
    }

    pub fn backoff_strategy(&self) -> &Arc<dyn BackoffStrategy> {
        &self.backoff
    }

    /// The condition as supplied, before the retry ceiling was AND-ed in.
    pub fn retry_condition(&self) -> &Arc<dyn RetryCondition> {
        &self.condition
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::standard().clone()
    }
}

impl RetryCondition for RetryPolicy {
    fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool {
        RetryPolicy::should_retry(self, ctx)
    }
}

impl BackoffStrategy for RetryPolicy {
    fn compute_delay_before_next_retry(&self, ctx: &AttemptContext<'_>) -> Duration {
        RetryPolicy::compute_delay_before_next_retry(self, ctx)
    }
}

/// Builder for `RetryPolicy`. Unset fields take their defaults in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct RetryPolicyBuilder {
    num_retries: Option<i32>,
    backoff: Option<Arc<dyn BackoffStrategy>>,
    condition: Option<Arc<dyn RetryCondition>>,
}

impl RetryPolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of retries after the initial attempt. Negative values fail at build time.
    pub fn num_retries(mut self, num_retries: i32) -> Self {
        self.num_retries = Some(num_retries);
        self
    }

    /// Set backoff strategy.
    pub fn backoff_strategy<B>(mut self, backoff: B) -> Self
    where
        B: BackoffStrategy + 'static,
    {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    /// Set a backoff strategy that is already shared.
    pub fn shared_backoff_strategy(mut self, backoff: Arc<dyn BackoffStrategy>) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Set retry condition. The retry ceiling is added on top at build time.
    pub fn retry_condition<C>(mut self, condition: C) -> Self
    where
        C: RetryCondition + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Set a retry condition that is already shared.
    pub fn shared_retry_condition(mut self, condition: Arc<dyn RetryCondition>) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn get_num_retries(&self) -> Option<i32> {
        self.num_retries
    }

    pub fn get_backoff_strategy(&self) -> Option<&Arc<dyn BackoffStrategy>> {
        self.backoff.as_ref()
    }

    pub fn get_retry_condition(&self) -> Option<&Arc<dyn RetryCondition>> {
        self.condition.as_ref()
    }

    /// Build the retry policy, validating inputs and filling unset fields with defaults.
    pub fn build(self) -> Result<RetryPolicy, BuildError> {
        let num_retries = match self.num_retries {
            Some(n) if n < 0 => return Err(BuildError::NegativeRetries(n)),
            Some(n) => n as u32,
            None => defaults::DEFAULT_NUM_RETRIES,
        };
        let backoff = self
            .backoff
            .unwrap_or_else(|| Arc::new(FullJitterBackoff::with_defaults(num_retries)));
        let condition = self.condition.unwrap_or_else(|| Arc::new(default_condition()));
        Ok(RetryPolicy::assemble(num_retries, backoff, condition))
    }
}
