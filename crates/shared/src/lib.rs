//! # lab-finder-shared
//!
//! Foundational types used by every other crate in the lab-finder workspace:
//!
//! - the error envelope and its taxonomy (validation, network, service, not-found)
//! - the shared `Result` alias
//! - request context with correlation ids and cancellation
//! - retry with exponential backoff
//! - secret and URL-credential redaction
//!
//! This crate has no workspace dependencies.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod concurrency;
pub mod errors;
pub mod redaction;
pub mod result;
pub mod retry;

pub use concurrency::{CancellationToken, CorrelationId, RequestContext};
pub use errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use redaction::{REDACTED, is_secret_key, redact_if_secret, strip_url_credentials};
pub use result::Result;
pub use retry::{RetryPolicy, retry_async, retry_async_with_observer};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
