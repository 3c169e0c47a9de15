//! Snapshot of one physical attempt, consulted by backoff strategies and retry conditions.
//!
//! The executor builds a fresh [`AttemptContext`] for every failed attempt; nothing mutates a
//! context after construction. `retries_attempted` is zero-based: `0` on the first failure.
//!
//! ```rust
//! use sdk_core::{AttemptContext, SdkError};
//!
//! let err = SdkError::service(503, "SlowDown", "reduce your request rate");
//! let ctx = AttemptContext::new(0).with_error(&err).with_status_code(503);
//! assert_eq!(ctx.retries_attempted(), 0);
//! assert_eq!(ctx.status_code(), Some(503));
//! ```

use crate::error::AttemptError;
use std::any::Any;
use std::fmt;

/// Immutable view of a failed attempt.
#[derive(Clone, Copy)]
pub struct AttemptContext<'a> {
    request: Option<&'a (dyn Any + Send + Sync)>,
    error: Option<&'a dyn AttemptError>,
    status_code: Option<u16>,
    retries_attempted: u32,
}

impl<'a> AttemptContext<'a> {
    /// Context for an attempt after `retries_attempted` retries have already been made.
    pub fn new(retries_attempted: u32) -> Self {
        Self { request: None, error: None, status_code: None, retries_attempted }
    }

    /// Attach the original request. Requests are treated as immutable once an attempt begins.
    pub fn with_request<R: Any + Send + Sync>(mut self, request: &'a R) -> Self {
        self.request = Some(request);
        self
    }

    /// Attach the failure of the last attempt. Also records its status code, if it has one and
    /// none was set explicitly.
    pub fn with_error(mut self, error: &'a dyn AttemptError) -> Self {
        self.error = Some(error);
        if self.status_code.is_none() {
            self.status_code = error.status_code();
        }
        self
    }

    /// Override the HTTP status code of the last response.
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// The original request, if attached.
    pub fn request(&self) -> Option<&'a (dyn Any + Send + Sync)> {
        self.request
    }

    /// The original request downcast to its concrete type.
    pub fn request_as<R: Any>(&self) -> Option<&'a R> {
        self.request.and_then(|r| r.downcast_ref::<R>())
    }

    pub fn error(&self) -> Option<&'a dyn AttemptError> {
        self.error
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn retries_attempted(&self) -> u32 {
        self.retries_attempted
    }
}

impl fmt::Debug for AttemptContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptContext")
            .field("request", &self.request.map(|_| "<request>"))
            .field("error", &self.error.map(|e| e.to_string()))
            .field("status_code", &self.status_code)
            .field("retries_attempted", &self.retries_attempted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, SdkError};

    #[derive(Debug, PartialEq)]
    struct ListTablesRequest {
        limit: u32,
    }

    #[test]
    fn error_status_code_is_picked_up() {
        let err = SdkError::service(502, "BadGateway", "upstream");
        let ctx = AttemptContext::new(1).with_error(&err);
        assert_eq!(ctx.status_code(), Some(502));
        assert_eq!(ctx.error().map(|e| e.kind()), Some(ErrorKind::Service));
    }

    #[test]
    fn explicit_status_code_wins_over_error() {
        let err = SdkError::service(502, "BadGateway", "upstream");
        let ctx = AttemptContext::new(0).with_status_code(504).with_error(&err);
        assert_eq!(ctx.status_code(), Some(504));
    }

    #[test]
    fn request_downcasts_to_concrete_type() {
        let req = ListTablesRequest { limit: 10 };
        let ctx = AttemptContext::new(0).with_request(&req);
        assert_eq!(ctx.request_as::<ListTablesRequest>(), Some(&req));
        assert!(ctx.request_as::<String>().is_none());
    }

    #[test]
    fn empty_context_has_nothing_attached() {
        let ctx = AttemptContext::new(2);
        assert!(ctx.request().is_none());
        assert!(ctx.error().is_none());
        assert!(ctx.status_code().is_none());
        assert_eq!(ctx.retries_attempted(), 2);
        assert!(format!("{:?}", ctx).contains("retries_attempted: 2"));
    }
}
