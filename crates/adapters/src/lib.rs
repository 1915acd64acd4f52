//! # lab-finder-adapters
//!
//! Adapter implementations for ports: the HTTP lab API, an in-memory lab API,
//! and JSON logging/telemetry. This crate depends on `ports`, `api`,
//! `config` and `shared`; never on `app` or `infra`.

pub mod lab_api;
pub mod log_sink;
pub mod logger;
pub mod telemetry;

pub use lab_api::{FixedLabApi, HttpLabApi, HttpLabApiConfig};
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use telemetry::{JsonTelemetry, MemoryTelemetry};

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
