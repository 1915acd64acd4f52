//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use lab_finder_config::{
    ClientEnv, ConfigFormat, ValidatedClientConfig, load_client_config_from_path, to_pretty_json,
    to_pretty_toml,
};
use lab_finder_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Load and validate the effective config from an env snapshot, an optional
/// file and an optional JSON overrides string.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<ValidatedClientConfig> {
    let env = ClientEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    load_client_config_from_path(config_path, overrides_json, &env)
}

/// Load and validate the effective config, returning deterministic pretty JSON.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<String> {
    render_effective_config(env, config_path, overrides_json, ConfigFormat::Json)
}

/// Load and validate the effective config, rendered in `format`.
pub fn render_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    format: ConfigFormat,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path, overrides_json)?;
    match format {
        ConfigFormat::Json => to_pretty_json(config.as_config()),
        ConfigFormat::Toml => to_pretty_toml(config.as_config()),
    }
}
