//! Default retry settings shared by [`RetryPolicy::standard`](crate::RetryPolicy::standard) and
//! the default retry condition.

use crate::error::ErrorKind;
use std::time::Duration;

/// Base delay of the default exponential backoff.
pub const BASE_DELAY: Duration = Duration::from_millis(100);

/// Absolute cap of the default exponential backoff.
pub const MAX_BACKOFF: Duration = Duration::from_millis(20_000);

/// Retries allowed when none are configured.
pub const DEFAULT_NUM_RETRIES: u32 = 3;

/// Delay of the no-retry policy's backoff. Only consulted if a retry happens anyway.
pub const NO_RETRY_DELAY: Duration = Duration::from_millis(1);

/// Service error codes that signal throttling.
pub const THROTTLING_ERROR_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ProvisionedThroughputExceededException",
    "SlowDown",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "BandwidthLimitExceeded",
    "RequestThrottled",
];

/// Service error codes that signal a skewed client clock.
pub const CLOCK_SKEW_ERROR_CODES: &[&str] = &[
    "RequestTimeTooSkewed",
    "RequestExpired",
    "InvalidSignatureException",
    "SignatureDoesNotMatch",
    "AuthFailure",
    "RequestInTheFuture",
];

/// Internal server error, bad gateway, service unavailable, gateway timeout.
pub const RETRYABLE_STATUS_CODES: &[u16] = &[500, 502, 503, 504];

pub const RETRYABLE_ERROR_KINDS: &[ErrorKind] = &[ErrorKind::Retryable, ErrorKind::Io];

/// Throttling and clock-skew codes together.
pub fn retryable_error_codes() -> impl Iterator<Item = &'static str> {
    THROTTLING_ERROR_CODES.iter().chain(CLOCK_SKEW_ERROR_CODES).copied()
}
