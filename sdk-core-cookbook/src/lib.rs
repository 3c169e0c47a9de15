//! Ready-to-use retry recipes (“cookbook”) for sdk-core.
//! Each function returns a built [`RetryPolicy`] you can hand to a [`RetryExecutor`].
//! The goal is pragmatic defaults that are safe for production.
//!
//! **Ladder:**
//! - Simple: [`standard`], [`no_retry`]
//! - Intermediate: [`throttling_only`], [`equal_jitter`]
//! - Long-running batch work: [`patient`]
//!
//! [`RetryExecutor`]: sdk_core::RetryExecutor

use std::time::Duration;

use sdk_core::condition::RetryOnErrorCode;
use sdk_core::defaults;
use sdk_core::{
    BuildError, EqualJitterBackoff, FullJitterBackoff, OrCondition, RetryOnStatusCode,
    RetryPolicy,
};

/// The shared standard policy: 3 retries, full jitter from 100ms capped at 20s, default condition.
pub fn standard() -> RetryPolicy {
    RetryPolicy::standard().clone()
}

/// One attempt, no retries.
pub fn no_retry() -> RetryPolicy {
    RetryPolicy::none().clone()
}

/// Retry only when the service says it is throttling (error code or HTTP 429).
pub fn throttling_only(num_retries: i32) -> Result<RetryPolicy, BuildError> {
    RetryPolicy::builder()
        .num_retries(num_retries)
        .retry_condition(
            OrCondition::new()
                .or(RetryOnErrorCode::new(defaults::THROTTLING_ERROR_CODES.iter().copied()))
                .or(RetryOnStatusCode::new([429])),
        )
        .build()
}

/// Many retries with a long cap, for batch jobs that prefer waiting over failing.
/// 10 retries, full jitter from 500ms capped at 60s, default condition.
pub fn patient() -> Result<RetryPolicy, Box<dyn std::error::Error>> {
    let backoff = FullJitterBackoff::new(Duration::from_millis(500), Duration::from_secs(60), 10)?;
    Ok(RetryPolicy::builder().num_retries(10).backoff_strategy(backoff).build()?)
}

/// Standard policy with equal jitter: every retry waits at least half its ceiling.
pub fn equal_jitter(
    base: Duration,
    max_backoff: Duration,
) -> Result<RetryPolicy, Box<dyn std::error::Error>> {
    let backoff = EqualJitterBackoff::new(base, max_backoff, defaults::DEFAULT_NUM_RETRIES)?;
    Ok(RetryPolicy::standard().to_builder().backoff_strategy(backoff).build()?)
}
