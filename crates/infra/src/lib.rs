//! # lab-finder-infra
//!
//! Composition root: turns validated config and env switches into a
//! ready-to-use [`LabFinderClient`].
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Session-scoped client facade.
pub mod client;
/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Logger and telemetry selection.
pub mod observability;
/// Blocking runtime helpers.
pub mod runtime;

pub use client::LabFinderClient;
pub use config_check::{load_effective_config, load_effective_config_json, render_effective_config};
pub use env_check::{InfraError, InfraResult, infra_error_to_api_v1, validate_env_parsing};
pub use lab_finder_api::v1::{ApiV1ErrorDto, ApiV1ErrorKind};
pub use lab_finder_app::FilterOptions;
pub use lab_finder_config::ConfigFormat;
pub use observability::{LOG_FORMAT_ENV, Observability, TELEMETRY_FORMAT_ENV};
pub use runtime::run_async_with_ctx;

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
