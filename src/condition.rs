//! Retry conditions: predicates over an [`AttemptContext`] deciding whether another attempt is
//! permitted.
//!
//! Conditions are pure and may be evaluated any number of times with the same context. Leaves
//! inspect one aspect of the failed attempt; [`AndCondition`] and [`OrCondition`] compose other
//! conditions and evaluate their children in declared order, stopping at the first child that
//! settles the answer.
//!
//! ```rust
//! use sdk_core::condition::{OrCondition, RetryCondition, RetryOnErrorCode, RetryOnStatusCode};
//! use sdk_core::{AttemptContext, SdkError};
//!
//! let condition = OrCondition::new()
//!     .or(RetryOnStatusCode::new([503]))
//!     .or(RetryOnErrorCode::new(["SlowDown"]));
//!
//! let err = SdkError::service(400, "SlowDown", "reduce your request rate");
//! assert!(condition.should_retry(&AttemptContext::new(0).with_error(&err)));
//! ```

use crate::context::AttemptContext;
use crate::defaults;
use crate::error::ErrorKind;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Decides whether a failed attempt may be retried.
pub trait RetryCondition: Send + Sync + fmt::Debug {
    fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool;
}

impl<C: RetryCondition + ?Sized> RetryCondition for Arc<C> {
    fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool {
        (**self).should_retry(ctx)
    }
}

/// True while fewer than `limit` retries have been attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxNumberOfRetries {
    limit: u32,
}

impl MaxNumberOfRetries {
    pub const fn new(limit: u32) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl RetryCondition for MaxNumberOfRetries {
    fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool {
        ctx.retries_attempted() < self.limit
    }
}

/// True when the last response carried one of the configured HTTP status codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOnStatusCode {
    status_codes: HashSet<u16>,
}

impl RetryOnStatusCode {
    pub fn new(status_codes: impl IntoIterator<Item = u16>) -> Self {
        Self { status_codes: status_codes.into_iter().collect() }
    }

    pub fn status_codes(&self) -> &HashSet<u16> {
        &self.status_codes
    }
}

impl Default for RetryOnStatusCode {
    /// 500, 502, 503, 504.
    fn default() -> Self {
        Self::new(defaults::RETRYABLE_STATUS_CODES.iter().copied())
    }
}

impl RetryCondition for RetryOnStatusCode {
    fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool {
        ctx.status_code().map_or(false, |code| self.status_codes.contains(&code))
    }
}

/// True when the last error carries one of the configured service error codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOnErrorCode {
    error_codes: HashSet<String>,
}

impl RetryOnErrorCode {
    pub fn new<S: Into<String>>(error_codes: impl IntoIterator<Item = S>) -> Self {
        Self { error_codes: error_codes.into_iter().map(Into::into).collect() }
    }

    pub fn error_codes(&self) -> &HashSet<String> {
        &self.error_codes
    }
}

impl Default for RetryOnErrorCode {
    /// Throttling and clock-skew codes.
    fn default() -> Self {
        Self::new(defaults::retryable_error_codes())
    }
}

impl RetryCondition for RetryOnErrorCode {
    fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool {
        ctx.error()
            .and_then(|e| e.error_code())
            .map_or(false, |code| self.error_codes.contains(code))
    }
}

/// True when the last error falls into one of the configured [`ErrorKind`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOnErrorKind {
    kinds: HashSet<ErrorKind>,
}

impl RetryOnErrorKind {
    pub fn new(kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        Self { kinds: kinds.into_iter().collect() }
    }

    pub fn kinds(&self) -> &HashSet<ErrorKind> {
        &self.kinds
    }
}

impl Default for RetryOnErrorKind {
    /// Explicitly retryable errors and I/O failures.
    fn default() -> Self {
        Self::new(defaults::RETRYABLE_ERROR_KINDS.iter().copied())
    }
}

impl RetryCondition for RetryOnErrorKind {
    fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool {
        ctx.error().map_or(false, |e| self.kinds.contains(&e.kind()))
    }
}

/// Never permits a retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverRetry;

impl RetryCondition for NeverRetry {
    fn should_retry(&self, _ctx: &AttemptContext<'_>) -> bool {
        false
    }
}

/// Always permits a retry; the policy's retry ceiling still applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlwaysRetry;

impl RetryCondition for AlwaysRetry {
    fn should_retry(&self, _ctx: &AttemptContext<'_>) -> bool {
        true
    }
}

/// Adapts a closure into a [`RetryCondition`].
pub struct FnCondition<F> {
    predicate: F,
}

impl<F> FnCondition<F>
where
    F: Fn(&AttemptContext<'_>) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> fmt::Debug for FnCondition<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCondition").field("predicate", &"<predicate>").finish()
    }
}

impl<F> RetryCondition for FnCondition<F>
where
    F: Fn(&AttemptContext<'_>) -> bool + Send + Sync,
{
    fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

/// True iff every child is true. Stops at the first false child.
#[derive(Debug, Clone, Default)]
pub struct AndCondition {
    children: Vec<Arc<dyn RetryCondition>>,
}

impl AndCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_children(children: impl IntoIterator<Item = Arc<dyn RetryCondition>>) -> Self {
        Self { children: children.into_iter().collect() }
    }

    /// Append a child evaluated after the existing ones.
    pub fn and<C: RetryCondition + 'static>(mut self, condition: C) -> Self {
        self.children.push(Arc::new(condition));
        self
    }

    pub fn children(&self) -> &[Arc<dyn RetryCondition>] {
        &self.children
    }
}

impl RetryCondition for AndCondition {
    fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool {
        self.children.iter().all(|c| c.should_retry(ctx))
    }
}

/// True iff at least one child is true. Stops at the first true child.
#[derive(Debug, Clone, Default)]
pub struct OrCondition {
    children: Vec<Arc<dyn RetryCondition>>,
}

impl OrCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_children(children: impl IntoIterator<Item = Arc<dyn RetryCondition>>) -> Self {
        Self { children: children.into_iter().collect() }
    }

    /// Append a child evaluated after the existing ones.
    pub fn or<C: RetryCondition + 'static>(mut self, condition: C) -> Self {
        self.children.push(Arc::new(condition));
        self
    }

    pub fn children(&self) -> &[Arc<dyn RetryCondition>] {
        &self.children
    }
}

impl RetryCondition for OrCondition {
    fn should_retry(&self, ctx: &AttemptContext<'_>) -> bool {
        self.children.iter().any(|c| c.should_retry(ctx))
    }
}

/// `OR(status code, error code, error kind)` with the default sets.
pub fn default_condition() -> OrCondition {
    OrCondition::new()
        .or(RetryOnStatusCode::default())
        .or(RetryOnErrorCode::default())
        .or(RetryOnErrorKind::default())
}
