//! Error types for retry and pagination.
//!
//! Transport and service failures are classified through [`AttemptError`], which is the only view
//! the retry conditions have of a failed attempt. [`SdkError`] is the concrete failure type the
//! bundled transports produce; callers with their own error types implement [`AttemptError`]
//! directly.
use std::fmt;

/// Coarse category of a failed attempt, consulted by
/// [`RetryOnErrorKind`](crate::condition::RetryOnErrorKind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// Explicitly marked as safe to retry by whoever raised it.
    Retryable,
    /// Connection, socket, or other I/O level failure.
    Io,
    /// The service answered with an error response.
    Service,
    /// Failed on the client side before or after the call (validation, marshalling).
    Client,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Retryable => "retryable",
            ErrorKind::Io => "io",
            ErrorKind::Service => "service",
            ErrorKind::Client => "client",
        };
        f.write_str(name)
    }
}

/// Classification of a failed physical attempt.
pub trait AttemptError: std::error::Error + Send + Sync {
    /// Category of the failure.
    fn kind(&self) -> ErrorKind;

    /// Service error code (e.g. `ThrottlingException`) when the service supplied one.
    fn error_code(&self) -> Option<&str> {
        None
    }

    /// HTTP status code of the failed response, if a response was received.
    fn status_code(&self) -> Option<u16> {
        None
    }
}

/// Error response returned by a service.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "service error (status {status_code}{}): {message}",
    detail_suffix(.error_code.as_deref(), .request_id.as_deref())
)]
pub struct ServiceError {
    pub status_code: u16,
    pub error_code: Option<String>,
    pub message: String,
    pub request_id: Option<String>,
}

impl ServiceError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self { status_code, error_code: None, message: message.into(), request_id: None }
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

fn detail_suffix(error_code: Option<&str>, request_id: Option<&str>) -> String {
    let mut suffix = String::new();
    if let Some(code) = error_code {
        suffix.push_str(", code ");
        suffix.push_str(code);
    }
    if let Some(id) = request_id {
        suffix.push_str(", request id ");
        suffix.push_str(id);
    }
    suffix
}

/// Failure of one physical call made by a client.
#[derive(thiserror::Error, Debug)]
pub enum SdkError {
    /// Error response from the service.
    #[error(transparent)]
    Service(ServiceError),
    /// Transport failure.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    /// Failure the raiser marked as retryable.
    #[error("retryable error: {message}")]
    Retryable { message: String },
    /// Client-side failure; never retried by the default condition.
    #[error("client error: {message}")]
    Client { message: String },
}

impl SdkError {
    pub fn service(status_code: u16, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        SdkError::Service(ServiceError::new(status_code, message).with_error_code(error_code))
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        SdkError::Retryable { message: message.into() }
    }

    pub fn client(message: impl Into<String>) -> Self {
        SdkError::Client { message: message.into() }
    }

    /// Borrow the service error if present.
    pub fn as_service(&self) -> Option<&ServiceError> {
        match self {
            SdkError::Service(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ServiceError> for SdkError {
    fn from(err: ServiceError) -> Self {
        SdkError::Service(err)
    }
}

impl AttemptError for SdkError {
    fn kind(&self) -> ErrorKind {
        match self {
            SdkError::Service(_) => ErrorKind::Service,
            SdkError::Io(_) => ErrorKind::Io,
            SdkError::Retryable { .. } => ErrorKind::Retryable,
            SdkError::Client { .. } => ErrorKind::Client,
        }
    }

    fn error_code(&self) -> Option<&str> {
        self.as_service().and_then(|e| e.error_code.as_deref())
    }

    fn status_code(&self) -> Option<u16> {
        self.as_service().map(|e| e.status_code)
    }
}

impl AttemptError for std::io::Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Io
    }
}

/// Errors produced while building a retry policy.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// `num_retries` must not be negative.
    #[error("num_retries must be >= 0 (got {0})")]
    NegativeRetries(i32),
}

/// Errors returned by backoff configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackoffError {
    #[error("max backoff must be greater than zero")]
    MaxMustBePositive,
    #[error("max backoff ({max:?}) must be >= base delay ({base:?})")]
    MaxLessThanBase { base: std::time::Duration, max: std::time::Duration },
}

/// Errors surfaced while advancing a page or item cursor.
#[derive(thiserror::Error, Debug)]
pub enum PaginationError<E> {
    /// A page was requested after the last page was returned.
    #[error("no more pages")]
    NoMorePages,
    /// An item was requested after the last item was returned.
    #[error("no more items")]
    NoMoreItems,
    /// Fetching the next page failed after every permitted retry.
    #[error(transparent)]
    Fetch(E),
}

impl<E> PaginationError<E> {
    /// True for the iteration-state errors (`NoMorePages`, `NoMoreItems`).
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::NoMorePages | Self::NoMoreItems)
    }

    /// Get the fetch failure if this is a `Fetch` variant.
    pub fn into_fetch(self) -> Option<E> {
        match self {
            Self::Fetch(e) => Some(e),
            _ => None,
        }
    }

    /// Borrow the fetch failure if present.
    pub fn as_fetch(&self) -> Option<&E> {
        match self {
            Self::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors raised while loading or resolving paginator definitions.
#[cfg(feature = "json")]
#[derive(thiserror::Error, Debug)]
pub enum PaginatorConfigError {
    /// The definitions document is not valid JSON of the expected shape.
    #[error("invalid paginator definitions: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no paginator defined for operation `{0}`")]
    UnknownOperation(String),
    /// A token or result-key path is empty or has an empty segment.
    #[error("paginator field `{field}` has an invalid path `{path}`")]
    InvalidPath { field: &'static str, path: String },
    /// The paginator has no `limit_key`, so page size cannot be set.
    #[error("paginator defines no limit_key")]
    NoLimitKey,
    /// Requests must be JSON objects so the input token can be set on them.
    #[error("request must be a JSON object, got {found}")]
    RequestNotObject { found: &'static str },
    /// The result key resolved to something that is neither a list nor a map.
    #[error("result key `{path}` is {found} on the first page, expected a list or map")]
    ResultKeyShape { path: String, found: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn service_error_display_includes_code_and_request_id() {
        let err = ServiceError::new(503, "try later")
            .with_error_code("SlowDown")
            .with_request_id("req-1");
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("SlowDown"));
        assert!(msg.contains("req-1"));
        assert!(msg.ends_with("try later"));
    }

    #[test]
    fn service_error_display_omits_absent_details() {
        assert_eq!(ServiceError::new(500, "boom").to_string(), "service error (status 500): boom");
        assert_eq!(
            ServiceError::new(503, "later").with_error_code("SlowDown").with_request_id("r1").to_string(),
            "service error (status 503, code SlowDown, request id r1): later"
        );
    }

    #[test]
    fn sdk_error_classifies_variants() {
        let svc = SdkError::service(400, "ThrottlingException", "slow down");
        assert_eq!(svc.kind(), ErrorKind::Service);
        assert_eq!(svc.error_code(), Some("ThrottlingException"));
        assert_eq!(svc.status_code(), Some(400));

        let io_err: SdkError = io::Error::new(io::ErrorKind::ConnectionReset, "reset").into();
        assert_eq!(io_err.kind(), ErrorKind::Io);
        assert!(io_err.error_code().is_none());
        assert!(io_err.status_code().is_none());

        assert_eq!(SdkError::retryable("x").kind(), ErrorKind::Retryable);
        assert_eq!(SdkError::client("x").kind(), ErrorKind::Client);
    }

    #[test]
    fn service_variant_is_transparent() {
        let err = SdkError::Service(ServiceError::new(500, "boom"));
        assert_eq!(err.to_string(), ServiceError::new(500, "boom").to_string());
    }

    #[test]
    fn build_error_display() {
        assert_eq!(BuildError::NegativeRetries(-1).to_string(), "num_retries must be >= 0 (got -1)");
    }

    #[test]
    fn fetch_error_keeps_original_display_and_source() {
        let err: PaginationError<SdkError> =
            PaginationError::Fetch(SdkError::Io(io::Error::new(io::ErrorKind::Other, "down")));
        assert_eq!(err.to_string(), "transport error: down");
        assert!(err.source().is_some());
        assert!(!err.is_exhausted());
        assert!(err.as_fetch().is_some());
        assert!(matches!(err.into_fetch(), Some(SdkError::Io(_))));
    }

    #[test]
    fn exhaustion_variants_are_not_fetch_errors() {
        let pages: PaginationError<SdkError> = PaginationError::NoMorePages;
        let items: PaginationError<SdkError> = PaginationError::NoMoreItems;
        assert!(pages.is_exhausted());
        assert!(items.is_exhausted());
        assert!(pages.into_fetch().is_none());
        assert_eq!(items.to_string(), "no more items");
    }
}
