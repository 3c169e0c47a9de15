#![forbid(unsafe_code)]

//! # sdk-core
//!
//! Runtime core shared by generated cloud-service clients: retry policies with jittered
//! exponential backoff, and lazy traversal of continuation-token paginated operations.
//!
//! ## Features
//!
//! - **Retry policies** built from one backoff strategy and one retry condition, with the retry
//!   ceiling always enforced on top of the condition
//! - **Backoff strategies**: fixed delay, full jitter, equal jitter
//! - **Retry conditions**: status codes, service error codes, error kinds, retry ceiling, and
//!   short-circuiting AND/OR composition
//! - **Blocking executor** that runs a request through a policy and surfaces the last error
//!   unchanged
//! - **Pagination**: page and item cursors that fetch the next page only when it is needed
//! - **JSON paginators** (feature `json`) driven by `input_token`/`output_token`/`result_key`
//!   definitions
//!
//! ## Quick Start
//!
//! ```rust
//! use sdk_core::{InstantSleeper, RetryExecutor, RetryPolicy, SdkError};
//!
//! let policy = RetryPolicy::standard().to_builder().num_retries(5).build().unwrap();
//! let executor = RetryExecutor::new(policy).with_sleeper(InstantSleeper);
//!
//! let mut failures = 2;
//! let result = executor.execute(&"DescribeTable", |_req| {
//!     if failures > 0 {
//!         failures -= 1;
//!         return Err(SdkError::service(500, "InternalServerError", "try again"));
//!     }
//!     Ok("ACTIVE")
//! });
//! assert_eq!(result.unwrap(), "ACTIVE");
//! ```

pub mod backoff;
pub mod condition;
#[cfg(feature = "json")]
pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod executor;
pub mod jitter;
pub mod pagination;
#[cfg(feature = "json")]
pub mod paginators;
pub mod prelude;
pub mod retry;
pub mod sleeper;
pub mod telemetry;

// Re-exports
pub use backoff::{BackoffStrategy, EqualJitterBackoff, FixedDelayBackoff, FullJitterBackoff};
pub use condition::{
    default_condition, AndCondition, MaxNumberOfRetries, OrCondition, RetryCondition,
    RetryOnErrorCode, RetryOnErrorKind, RetryOnStatusCode,
};
pub use context::AttemptContext;
pub use error::{
    AttemptError, BackoffError, BuildError, ErrorKind, PaginationError, SdkError, ServiceError,
};
pub use executor::RetryExecutor;
pub use jitter::Jitter;
pub use pagination::{ItemSequence, PageFetcher, PageSequence, Paginator, TokenFetcher};
pub use retry::{RetryPolicy, RetryPolicyBuilder};
pub use sleeper::{InstantSleeper, Sleeper, ThreadSleeper, TrackingSleeper};
pub use telemetry::{LogSink, MemorySink, NullSink, SdkEvent, TelemetrySink};
