//! Blocking request executor: runs one logical request through a [`RetryPolicy`].
//!
//! State machine per request: `Attempting(n)` starts at `n = 0`. A success ends in `Succeeded`.
//! A failure builds a fresh [`AttemptContext`] with `retries_attempted = n`; if the policy grants
//! a retry the executor sleeps the computed delay and moves to `Attempting(n + 1)`, otherwise it
//! ends in `Failed` and returns the last error unchanged. Every transition between attempts
//! sleeps; none skip the backoff.
//!
//! The retry counter lives on the stack of [`RetryExecutor::execute`], so a single executor can be
//! shared by any number of threads.
//!
//! The request is handed to every attempt by shared reference and must not be mutated while the
//! loop runs.
//!
//! ```rust
//! use sdk_core::{InstantSleeper, RetryExecutor, RetryPolicy, SdkError};
//! use std::cell::Cell;
//!
//! let executor = RetryExecutor::new(RetryPolicy::standard().clone()).with_sleeper(InstantSleeper);
//! let calls = Cell::new(0);
//! let result = executor.execute(&"ListTables", |_req| {
//!     calls.set(calls.get() + 1);
//!     if calls.get() < 3 {
//!         Err(SdkError::service(503, "ServiceUnavailable", "busy"))
//!     } else {
//!         Ok("tables")
//!     }
//! });
//! assert_eq!(result.unwrap(), "tables");
//! assert_eq!(calls.get(), 3);
//! ```

use crate::context::AttemptContext;
use crate::error::AttemptError;
use crate::retry::RetryPolicy;
use crate::sleeper::{Sleeper, ThreadSleeper};
use crate::telemetry::{NullSink, RequestOutcome, RetryEvent, SdkEvent, TelemetrySink};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

/// Executes attempts under a retry policy, sleeping on the calling thread between them.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    sink: Arc<dyn TelemetrySink>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, sleeper: Arc::new(ThreadSleeper), sink: Arc::new(NullSink) }
    }

    /// Provide a custom sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Attach a telemetry sink.
    pub fn with_sink<T>(mut self, sink: T) -> Self
    where
        T: TelemetrySink + 'static,
    {
        self.sink = Arc::new(sink);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `attempt` until it succeeds or the policy refuses another retry.
    ///
    /// On refusal the error of the last attempt is returned as is.
    pub fn execute<Req, T, E, F>(&self, request: &Req, mut attempt: F) -> Result<T, E>
    where
        Req: Any + Send + Sync,
        E: AttemptError,
        F: FnMut(&Req) -> Result<T, E>,
    {
        let started = Instant::now();
        let mut retries_attempted: u32 = 0;
        loop {
            let err = match attempt(request) {
                Ok(value) => {
                    self.sink.record(&SdkEvent::Request(RequestOutcome::Success {
                        attempts: retries_attempted + 1,
                        duration: started.elapsed(),
                    }));
                    return Ok(value);
                }
                Err(err) => err,
            };

            let ctx = AttemptContext::new(retries_attempted).with_request(request).with_error(&err);
            if !self.policy.should_retry(&ctx) {
                self.give_up(&ctx, &err, started);
                return Err(err);
            }

            let delay = self.policy.compute_delay_before_next_retry(&ctx);
            tracing::debug!(
                retries_attempted,
                status = ?ctx.status_code(),
                error_code = ?err.error_code(),
                delay_ms = delay.as_millis() as u64,
                "retrying request"
            );
            self.sink.record(&SdkEvent::Retry(RetryEvent::Attempt {
                attempt: retries_attempted + 1,
                delay,
            }));
            self.sleeper.sleep(delay);
            retries_attempted += 1;
        }
    }

    fn give_up<E: AttemptError>(&self, ctx: &AttemptContext<'_>, err: &E, started: Instant) {
        let total_attempts = ctx.retries_attempted() + 1;
        let total_duration = started.elapsed();
        let event = if ctx.retries_attempted() >= self.policy.num_retries() {
            tracing::warn!(total_attempts, error = %err, "retries exhausted");
            RetryEvent::Exhausted { total_attempts, total_duration }
        } else {
            tracing::warn!(total_attempts, kind = %err.kind(), error = %err, "error is not retryable");
            RetryEvent::NotRetryable { total_attempts }
        };
        self.sink.record(&SdkEvent::Retry(event));
        self.sink.record(&SdkEvent::Request(RequestOutcome::Failure {
            attempts: total_attempts,
            duration: total_duration,
        }));
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
