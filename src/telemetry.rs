//! Telemetry for retry loops and paginated traversals.
//!
//! The executor and the page cursor describe what they do as [`SdkEvent`]s and hand them,
//! synchronously, to a [`TelemetrySink`]. Sinks must not block for long: they run on the
//! calling thread between network round trips.
//!
//! # Event Types
//!
//! - **Retry**: `Attempt`, `Exhausted`, `NotRetryable`
//! - **Page**: `Fetched`, `Finished`
//! - **Request**: `Success`, `Failure` (one per logical request, after all attempts)
//!
//! ```rust
//! use sdk_core::telemetry::{MemorySink, RetryEvent, SdkEvent, TelemetrySink};
//! use std::time::Duration;
//!
//! let sink = MemorySink::new();
//! sink.record(&SdkEvent::Retry(RetryEvent::Attempt { attempt: 1, delay: Duration::from_millis(80) }));
//! assert_eq!(sink.len(), 1);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Events emitted while executing requests and traversing pages.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkEvent {
    /// Retry loop events
    Retry(RetryEvent),
    /// Pagination events
    Page(PageEvent),
    /// Request outcome events
    Request(RequestOutcome),
}

/// Events emitted by the retry executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    /// A retry is about to be made, after sleeping `delay`.
    Attempt {
        /// The retry number (1-indexed)
        attempt: u32,
        /// The backoff delay before this retry
        delay: Duration,
    },
    /// The retry ceiling was reached and the last failure is surfaced.
    Exhausted {
        /// Total number of attempts made, including the initial one
        total_attempts: u32,
        /// Total time spent in the loop
        total_duration: Duration,
    },
    /// The retry condition rejected the failure before the ceiling was reached.
    NotRetryable {
        /// Total number of attempts made, including the initial one
        total_attempts: u32,
    },
}

/// Events emitted by page cursors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A page after the first was fetched.
    Fetched {
        /// 1-indexed position of the page in the traversal
        page_number: usize,
    },
    /// The last page has been returned.
    Finished {
        /// Pages returned by the traversal
        pages: usize,
    },
}

/// Outcome of one logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Request completed successfully.
    Success {
        /// Attempts made, including the initial one
        attempts: u32,
        /// Time taken including backoff
        duration: Duration,
    },
    /// Request failed after all permitted attempts.
    Failure {
        /// Attempts made, including the initial one
        attempts: u32,
        /// Time taken including backoff
        duration: Duration,
    },
}

impl fmt::Display for SdkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkEvent::Retry(event) => write!(f, "Retry::{}", event),
            SdkEvent::Page(event) => write!(f, "Page::{}", event),
            SdkEvent::Request(event) => write!(f, "Request::{}", event),
        }
    }
}

impl fmt::Display for RetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryEvent::Attempt { attempt, delay } => {
                write!(f, "Attempt(#{}, delay={:?})", attempt, delay)
            }
            RetryEvent::Exhausted { total_attempts, total_duration } => {
                write!(f, "Exhausted(attempts={}, duration={:?})", total_attempts, total_duration)
            }
            RetryEvent::NotRetryable { total_attempts } => {
                write!(f, "NotRetryable(attempts={})", total_attempts)
            }
        }
    }
}

impl fmt::Display for PageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageEvent::Fetched { page_number } => write!(f, "Fetched(#{})", page_number),
            PageEvent::Finished { pages } => write!(f, "Finished(pages={})", pages),
        }
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestOutcome::Success { attempts, duration } => {
                write!(f, "Success(attempts={}, duration={:?})", attempts, duration)
            }
            RequestOutcome::Failure { attempts, duration } => {
                write!(f, "Failure(attempts={}, duration={:?})", attempts, duration)
            }
        }
    }
}

/// Consumes events. Called on the thread that produced the event.
pub trait TelemetrySink: Send + Sync + fmt::Debug {
    fn record(&self, event: &SdkEvent);
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for Arc<S> {
    fn record(&self, event: &SdkEvent) {
        (**self).record(event)
    }
}

/// A no-op telemetry sink that discards all events.
#[derive(Clone, Debug, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&self, _event: &SdkEvent) {}
}

/// A telemetry sink that logs events using the `tracing` crate.
///
/// Events are logged at INFO level with structured fields.
#[derive(Clone, Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn record(&self, event: &SdkEvent) {
        tracing::info!(event = %event, "sdk_event");
    }
}

/// A telemetry sink that stores events in memory.
///
/// Useful for testing and debugging. Oldest events are evicted once capacity is reached.
#[derive(Clone, Debug)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<SdkEvent>>>,
    capacity: usize,
    evicted: Arc<AtomicU64>,
}

impl MemorySink {
    /// Creates a bounded memory sink (default cap: 10,000).
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Creates a bounded memory sink with explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            capacity: capacity.max(1),
            evicted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a snapshot of all events received so far.
    pub fn events(&self) -> Vec<SdkEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Clears all stored events.
    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of evicted events.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink for MemorySink {
    fn record(&self, event: &SdkEvent) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if events.len() >= self.capacity {
            events.remove(0);
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        events.push(event.clone());
    }
}
