//! Backoff strategies for retry policies.
//!
//! A strategy is only consulted once a retry has already been granted; it never decides whether
//! to retry. Three strategies ship with the crate:
//!
//! - [`FixedDelayBackoff`]: the same delay on every retry.
//! - [`FullJitterBackoff`]: uniform in `[0, ceiling]`.
//! - [`EqualJitterBackoff`]: `ceiling/2 + uniform[0, ceiling/2]`.
//!
//! The jittered strategies share the exponential ceiling computed by [`exponential_delay`]:
//! `min(2^min(retries_attempted, max_retries) * base, max_backoff)`. The exponent stops growing
//! at `max_retries`, so the ceiling saturates instead of overflowing.
//!
//! ```rust
//! use sdk_core::backoff::exponential_delay;
//! use std::time::Duration;
//!
//! let base = Duration::from_millis(100);
//! let cap = Duration::from_secs(20);
//! assert_eq!(exponential_delay(0, base, cap, 3), Duration::from_millis(100));
//! assert_eq!(exponential_delay(2, base, cap, 3), Duration::from_millis(400));
//! assert_eq!(exponential_delay(9, base, cap, 3), Duration::from_millis(800)); // exponent capped at 3
//! ```

use crate::context::AttemptContext;
use crate::defaults;
use crate::error::BackoffError;
use crate::jitter::{as_millis_saturated, Jitter};
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// Trait implemented by all backoff strategies.
pub trait BackoffStrategy: Send + Sync + fmt::Debug {
    /// Delay before the next retry. Only called when that retry will happen.
    fn compute_delay_before_next_retry(&self, ctx: &AttemptContext<'_>) -> Duration;
}

/// Exponential ceiling shared by the jittered strategies, in whole milliseconds.
pub fn exponential_delay(
    retries_attempted: u32,
    base: Duration,
    max_backoff: Duration,
    max_retries: u32,
) -> Duration {
    let exponent = retries_attempted.min(max_retries);
    let multiplier = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    let millis = as_millis_saturated(base).saturating_mul(multiplier);
    Duration::from_millis(millis.min(as_millis_saturated(max_backoff)))
}

/// Constant delay regardless of the attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelayBackoff {
    delay: Duration,
}

impl FixedDelayBackoff {
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl BackoffStrategy for FixedDelayBackoff {
    fn compute_delay_before_next_retry(&self, _ctx: &AttemptContext<'_>) -> Duration {
        self.delay
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExponentialCeiling {
    base: Duration,
    max_backoff: Duration,
    max_retries: u32,
}

impl ExponentialCeiling {
    fn validated(base: Duration, max_backoff: Duration, max_retries: u32) -> Result<Self, BackoffError> {
        if max_backoff.is_zero() {
            return Err(BackoffError::MaxMustBePositive);
        }
        if max_backoff < base {
            return Err(BackoffError::MaxLessThanBase { base, max: max_backoff });
        }
        Ok(Self { base, max_backoff, max_retries })
    }

    fn at(&self, retries_attempted: u32) -> Duration {
        exponential_delay(retries_attempted, self.base, self.max_backoff, self.max_retries)
    }
}

macro_rules! jittered_backoff {
    ($(#[$doc:meta])* $name:ident, $jitter:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            ceiling: ExponentialCeiling,
        }

        impl $name {
            /// Returns an error if `max_backoff` is zero or smaller than `base`.
            pub fn new(
                base: Duration,
                max_backoff: Duration,
                max_retries: u32,
            ) -> Result<Self, BackoffError> {
                Ok(Self { ceiling: ExponentialCeiling::validated(base, max_backoff, max_retries)? })
            }

            /// Uses the default base delay and cap with `max_retries` as the capping bound.
            pub fn with_defaults(max_retries: u32) -> Self {
                Self {
                    ceiling: ExponentialCeiling {
                        base: defaults::BASE_DELAY,
                        max_backoff: defaults::MAX_BACKOFF,
                        max_retries,
                    },
                }
            }

            pub fn base_delay(&self) -> Duration {
                self.ceiling.base
            }

            pub fn max_backoff(&self) -> Duration {
                self.ceiling.max_backoff
            }

            pub fn max_retries(&self) -> u32 {
                self.ceiling.max_retries
            }

            /// Exponential ceiling before jitter for `retries_attempted`.
            pub fn ceiling(&self, retries_attempted: u32) -> Duration {
                self.ceiling.at(retries_attempted)
            }

            /// Compute the delay with a custom RNG (for testing)
            pub fn delay_with_rng<R: Rng>(&self, ctx: &AttemptContext<'_>, rng: &mut R) -> Duration {
                $jitter.apply_with_rng(self.ceiling(ctx.retries_attempted()), rng)
            }
        }

        impl BackoffStrategy for $name {
            fn compute_delay_before_next_retry(&self, ctx: &AttemptContext<'_>) -> Duration {
                $jitter.apply(self.ceiling(ctx.retries_attempted()))
            }
        }
    };
}

jittered_backoff!(
    /// Exponential backoff with full jitter: uniform in `[0, ceiling]`.
    FullJitterBackoff,
    Jitter::Full
);

jittered_backoff!(
    /// Exponential backoff with equal jitter: at least half the ceiling, at most the ceiling.
    EqualJitterBackoff,
    Jitter::Equal
);
