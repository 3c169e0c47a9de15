//! Jitter applied to an exponential backoff ceiling.
//!
//! When to use which strategy:
//! - `Full`: uniform in `[0, ceiling]`, widest spread, the default.
//! - `Equal`: `ceiling/2 + uniform[0, ceiling/2]`, keeps a floor of half the ceiling.
//!
//! Notes:
//! - RNG: uses `rand`'s thread-local RNG by default; deterministic RNGs can be injected via
//!   `apply_with_rng`.
//! - Precision: whole milliseconds. Conversions saturate to `u64::MAX` to avoid panics on very
//!   large durations.
//!
//! ```rust
//! use sdk_core::Jitter;
//! use std::time::Duration;
//!
//! let delay = Jitter::Equal.apply(Duration::from_millis(400));
//! assert!(delay >= Duration::from_millis(200) && delay <= Duration::from_millis(400));
//! ```

use rand::{rng, Rng};
use std::time::Duration;

/// Jitter strategy for randomizing retry delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// Full jitter: random between 0 and the ceiling
    Full,
    /// Equal jitter: half the ceiling plus a random share of the other half
    Equal,
}

impl Jitter {
    /// Apply jitter to a ceiling using the thread-local RNG.
    pub fn apply(&self, ceiling: Duration) -> Duration {
        let mut rng = rng();
        self.apply_with_rng(ceiling, &mut rng)
    }

    /// Apply jitter with a custom RNG (for testing)
    pub fn apply_with_rng<R: Rng>(&self, ceiling: Duration, rng: &mut R) -> Duration {
        let millis = as_millis_saturated(ceiling);
        if millis == 0 {
            return Duration::ZERO;
        }
        let jittered = match self {
            Jitter::Full => rng.random_range(0..=millis),
            Jitter::Equal => {
                let half = millis / 2;
                half + rng.random_range(0..=half)
            }
        };
        Duration::from_millis(jittered)
    }
}

pub(crate) fn as_millis_saturated(duration: Duration) -> u64 {
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}
