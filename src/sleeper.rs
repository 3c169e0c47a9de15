//! Abstraction for blocking between retry attempts
//!
//! Enables fast, deterministic tests without real time delays

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Blocks the calling thread for a backoff delay.
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper: `std::thread::sleep` on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Test sleeper that doesn't actually sleep
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) {}
}

/// Test sleeper that records every requested delay
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded delays, oldest first.
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn call_at(&self, index: usize) -> Option<Duration> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).get(index).copied()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn instant_sleeper_doesnt_sleep() {
        let start = Instant::now();
        InstantSleeper.sleep(Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn tracking_sleeper_records_calls() {
        let sleeper = TrackingSleeper::new();
        sleeper.sleep(Duration::from_millis(100));
        sleeper.sleep(Duration::from_millis(200));
        sleeper.sleep(Duration::from_millis(400));

        assert_eq!(sleeper.call_count(), 3);
        assert_eq!(sleeper.call_at(0), Some(Duration::from_millis(100)));
        assert_eq!(sleeper.call_at(2), Some(Duration::from_millis(400)));
        assert_eq!(sleeper.call_at(3), None);
    }

    #[test]
    fn tracking_sleeper_clones_share_state() {
        let sleeper = TrackingSleeper::new();
        let clone = sleeper.clone();
        clone.sleep(Duration::from_millis(5));
        assert_eq!(sleeper.calls(), vec![Duration::from_millis(5)]);

        sleeper.clear();
        assert_eq!(clone.call_count(), 0);
    }

    #[test]
    fn thread_sleeper_actually_sleeps() {
        let start = Instant::now();
        ThreadSleeper.sleep(Duration::from_millis(20));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
