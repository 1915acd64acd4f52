//! # lab-finder-config
//!
//! Client configuration schema, validation and normalization, plus env and
//! file loading. This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    ApiConfig, CURRENT_CONFIG_VERSION, ClientConfig, ConfigSchemaError, DEFAULT_API_BASE_URL,
    LogLevelName, LoggingConfig, RetryConfig, SearchConfig, SimilarFallback, SimilarLabsConfig,
    ValidatedClientConfig, parse_client_config_json, parse_client_config_toml,
};

pub use env::{ClientEnv, EnvParseError, apply_env_overrides};
pub use load::{
    ConfigFormat, load_client_config_from_path, load_client_config_from_sources,
    to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
