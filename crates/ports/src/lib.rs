//! # lab-finder-ports
//!
//! Port traits for the lab-finder hexagonal architecture.
//!
//! This crate defines the interfaces between the use cases and the
//! infrastructure that talks to the backend, logs, and records metrics. It
//! depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod lab_api;
pub mod logger;
pub mod telemetry;

pub use lab_api::*;
pub use logger::*;
pub use telemetry::*;

// Domain types used in port signatures, so adapters can implement ports
// without a direct `lab-finder-domain` dependency.
pub use lab_finder_domain::{
    HealthStatus, ResearchLab, SearchRequest, SearchResponse, SearchResultRecord, Suggestion,
};
