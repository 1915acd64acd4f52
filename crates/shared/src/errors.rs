//! Error envelope and the client-side error taxonomy.
//!
//! Every failure that crosses a crate boundary is an [`ErrorEnvelope`]. The
//! [`ErrorKind`] carries the user-facing taxonomy:
//!
//! - `Validation`: bad local input, handled before any request is issued
//! - `Network`: no response reached the client
//! - `Service`: the backend answered with a non-2xx status
//! - `NotFound`: 404 on a resource lookup
//! - `Cancelled`: the view went away or a newer request superseded this one
//! - `Internal`: bugs and undecodable payloads for typed resources

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, io};

/// Metadata attached to errors for diagnostics.
pub type ErrorMetadata = BTreeMap<String, String>;

/// Taxonomy bucket for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad local input (blank query, out-of-range filter value).
    Validation,
    /// Transport failure: no response reached the client.
    Network,
    /// Non-2xx HTTP response.
    Service,
    /// 404 on a resource lookup.
    NotFound,
    /// The operation was cancelled before it completed.
    Cancelled,
    /// Unexpected failure inside the client.
    Internal,
}

impl ErrorKind {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Service => "service",
            Self::NotFound => "not_found",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Retry classification for failure handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The operation can be retried safely.
    Retriable,
    /// The operation should not be retried.
    NonRetriable,
}

impl ErrorClass {
    /// Returns true when the error is considered retriable.
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Retriable)
    }

    /// Retry class for an HTTP status: 408, 429 and 5xx are retriable.
    #[must_use]
    pub const fn for_status(status: u16) -> Self {
        if status == 408 || status == 429 || status >= 500 {
            Self::Retriable
        } else {
            Self::NonRetriable
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retriable => formatter.write_str("retriable"),
            Self::NonRetriable => formatter.write_str("non-retriable"),
        }
    }
}

/// Stable error code with namespace and identifier, rendered as `namespace:code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Create a new error code with a namespace and code.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Core cancellation code.
    pub fn cancelled() -> Self {
        Self::new("core", "cancelled")
    }

    /// Invalid input code.
    pub fn invalid_input() -> Self {
        Self::new("core", "invalid_input")
    }

    /// Internal failure code.
    pub fn internal() -> Self {
        Self::new("core", "internal")
    }

    /// Local I/O failure code.
    pub fn io() -> Self {
        Self::new("core", "io")
    }

    /// Transport failure code.
    pub fn network() -> Self {
        Self::new("http", "network")
    }

    /// Request timed out before a response arrived.
    pub fn timeout() -> Self {
        Self::new("http", "timeout")
    }

    /// Non-2xx response code.
    pub fn service() -> Self {
        Self::new("http", "service")
    }

    /// 404 response on a resource lookup.
    pub fn not_found() -> Self {
        Self::new("http", "not_found")
    }

    /// A 2xx response whose body could not be decoded.
    pub fn decode() -> Self {
        Self::new("http", "decode")
    }

    /// Returns the namespace portion.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the code identifier.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Structured error envelope shared across crates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Taxonomy bucket.
    pub kind: ErrorKind,
    /// Retry classification.
    pub class: ErrorClass,
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status for service and not-found errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Additional diagnostic metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    fn build(kind: ErrorKind, class: ErrorClass, code: ErrorCode, message: String) -> Self {
        Self {
            kind,
            class,
            code,
            message,
            status: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Local validation failure; never retriable.
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(
            ErrorKind::Validation,
            ErrorClass::NonRetriable,
            code,
            message.into(),
        )
    }

    /// Transport failure with the generic network code.
    pub fn network(message: impl Into<String>) -> Self {
        Self::network_with_code(ErrorCode::network(), message)
    }

    /// Transport failure with an explicit code (timeouts, connect errors).
    pub fn network_with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(ErrorKind::Network, ErrorClass::Retriable, code, message.into())
    }

    /// Non-2xx response. Retry class follows the status.
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        let mut error = Self::build(
            ErrorKind::Service,
            ErrorClass::for_status(status),
            ErrorCode::service(),
            message.into(),
        );
        error.status = Some(status);
        error
    }

    /// 404 on a resource lookup.
    pub fn not_found(message: impl Into<String>) -> Self {
        let mut error = Self::build(
            ErrorKind::NotFound,
            ErrorClass::NonRetriable,
            ErrorCode::not_found(),
            message.into(),
        );
        error.status = Some(404);
        error
    }

    /// Cancellation error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::build(
            ErrorKind::Cancelled,
            ErrorClass::NonRetriable,
            ErrorCode::cancelled(),
            message.into(),
        )
    }

    /// Internal failure.
    pub fn internal(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(
            ErrorKind::Internal,
            ErrorClass::NonRetriable,
            code,
            message.into(),
        )
    }

    /// Returns true if the error represents a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }

    /// Returns true for the kinds a view offers a retry affordance for.
    #[must_use]
    pub const fn is_retry_offered(&self) -> bool {
        matches!(self.kind, ErrorKind::Network | ErrorKind::Service)
    }

    /// Attach a single metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                formatter,
                "{} {} (status {status}): {}",
                self.kind, self.code, self.message
            ),
            None => write!(formatter, "{} {}: {}", self.kind, self.code, self.message),
        }
    }
}

impl std::error::Error for ErrorEnvelope {}

impl From<io::Error> for ErrorEnvelope {
    fn from(error: io::Error) -> Self {
        let message = error.to_string();
        match error.kind() {
            io::ErrorKind::Interrupted => Self::cancelled(message),
            io::ErrorKind::TimedOut => Self::network_with_code(ErrorCode::timeout(), message),
            kind => Self::internal(ErrorCode::io(), message)
                .with_metadata("ioKind", format!("{kind:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_class_follows_status() {
        let bad_request = ErrorEnvelope::service(400, "bad");
        assert_eq!(bad_request.kind, ErrorKind::Service);
        assert_eq!(bad_request.status, Some(400));
        assert_eq!(bad_request.class, ErrorClass::NonRetriable);

        for status in [408, 429, 500, 503] {
            assert!(ErrorEnvelope::service(status, "x").class.is_retriable());
        }
    }

    #[test]
    fn not_found_carries_status_and_code() {
        let error = ErrorEnvelope::not_found("lab 999 not found");
        assert_eq!(error.kind, ErrorKind::NotFound);
        assert_eq!(error.status, Some(404));
        assert_eq!(error.code.to_string(), "http:not_found");
        assert!(!error.is_retry_offered());
    }

    #[test]
    fn network_errors_are_retriable_and_offer_retry() {
        let error = ErrorEnvelope::network("connection refused");
        assert!(error.class.is_retriable());
        assert!(error.is_retry_offered());
    }

    #[test]
    fn display_includes_status_when_present() {
        let error = ErrorEnvelope::service(502, "upstream down");
        assert_eq!(
            error.to_string(),
            "service http:service (status 502): upstream down"
        );

        let error = ErrorEnvelope::validation(ErrorCode::invalid_input(), "blank");
        assert_eq!(error.to_string(), "validation core:invalid_input: blank");
    }

    #[test]
    fn io_errors_are_classified() {
        let timed_out: ErrorEnvelope = io::Error::new(io::ErrorKind::TimedOut, "slow").into();
        assert_eq!(timed_out.kind, ErrorKind::Network);

        let missing: ErrorEnvelope = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(missing.kind, ErrorKind::Internal);
        assert_eq!(missing.code, ErrorCode::io());
    }
}
