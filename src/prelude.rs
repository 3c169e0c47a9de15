//! Convenient re-exports for common sdk-core types.
pub use crate::{
    backoff::{BackoffStrategy, EqualJitterBackoff, FixedDelayBackoff, FullJitterBackoff},
    condition::{
        AndCondition, FnCondition, MaxNumberOfRetries, NeverRetry, OrCondition, RetryCondition,
        RetryOnErrorCode, RetryOnErrorKind, RetryOnStatusCode,
    },
    context::AttemptContext,
    error::{AttemptError, BuildError, ErrorKind, PaginationError, SdkError, ServiceError},
    executor::RetryExecutor,
    pagination::{FnFetcher, ItemSequence, PageFetcher, PageSequence, Paginator, TokenFetcher},
    retry::{RetryPolicy, RetryPolicyBuilder},
    sleeper::{InstantSleeper, Sleeper, ThreadSleeper},
    telemetry::{LogSink, MemorySink, NullSink, SdkEvent, TelemetrySink},
};
