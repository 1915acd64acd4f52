//! Config loading helpers (env + file + overrides).
//!
//! The loader owns the merge order and surfaces every failure as a
//! `Validation` envelope with a `config:*` code.

use crate::{
    ClientConfig, ClientEnv, LogLevelName, SimilarFallback, ValidatedClientConfig,
    apply_env_overrides,
};
use lab_finder_shared::{ErrorCode, ErrorEnvelope};
use serde::Deserialize;
use std::path::Path;

/// Serialization format of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
}

/// Load the client config from in-memory sources.
///
/// Precedence (highest wins):
/// - env overrides (`ClientEnv`)
/// - overrides JSON (partial config)
/// - config document
/// - defaults (`ClientConfig::default()`)
pub fn load_client_config_from_sources(
    config: Option<(&str, ConfigFormat)>,
    overrides_json: Option<&str>,
    env: &ClientEnv,
) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let mut base = match config {
        None => ClientConfig::default(),
        Some((input, format)) => parse_config_unvalidated(input, format)?,
    };

    if let Some(input) = overrides_json {
        parse_overrides_json(input)?.apply(&mut base);
    }

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(base, env)
}

/// Load the client config from an optional file path (format by extension).
pub fn load_client_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &ClientEnv,
) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    match config_path {
        None => load_client_config_from_sources(None, overrides_json, env),
        Some(path) => {
            let format = detect_config_format(path)?;
            let text = read_config_file(path)?;
            load_client_config_from_sources(Some((&text, format)), overrides_json, env)
        },
    }
}

/// Serialize the config as pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &ClientConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::internal(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &ClientConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::internal(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
        )
    })?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<ClientConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::validation(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::validation(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn parse_overrides_json(input: &str) -> Result<ClientConfigOverrides, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::validation(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid overrides JSON: {error}"),
        )
        .with_metadata("source", "overrides")
    })
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::validation(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::validation(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ClientConfigOverrides {
    version: Option<u32>,
    api: ApiOverrides,
    retry: RetryOverrides,
    search: SearchOverrides,
    similar_labs: SimilarLabsOverrides,
    logging: LoggingOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ApiOverrides {
    base_url: Option<Box<str>>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct RetryOverrides {
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    jitter_ratio_pct: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct SearchOverrides {
    default_limit: Option<u32>,
    similar_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct SimilarLabsOverrides {
    fallback: Option<SimilarFallback>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct LoggingOverrides {
    level: Option<LogLevelName>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl ClientConfigOverrides {
    fn apply(self, config: &mut ClientConfig) {
        set(&mut config.version, self.version);
        set(&mut config.api.base_url, self.api.base_url);
        set(&mut config.api.timeout_ms, self.api.timeout_ms);
        set(&mut config.retry.max_attempts, self.retry.max_attempts);
        set(&mut config.retry.base_delay_ms, self.retry.base_delay_ms);
        set(&mut config.retry.max_delay_ms, self.retry.max_delay_ms);
        set(&mut config.retry.jitter_ratio_pct, self.retry.jitter_ratio_pct);
        set(&mut config.search.default_limit, self.search.default_limit);
        set(&mut config.search.similar_limit, self.search.similar_limit);
        set(&mut config.similar_labs.fallback, self.similar_labs.fallback);
        set(&mut config.logging.level, self.logging.level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_only_touch_named_fields() -> Result<(), ErrorEnvelope> {
        let file = r#"{"api": {"baseUrl": "http://file:8000", "timeoutMs": 5000}}"#;
        let overrides = r#"{"api": {"timeoutMs": 7000}, "similarLabs": {"fallback": "surface"}}"#;

        let config = load_client_config_from_sources(
            Some((file, ConfigFormat::Json)),
            Some(overrides),
            &ClientEnv::default(),
        )?;

        assert_eq!(config.api_base_url(), "http://file:8000");
        assert_eq!(config.api.timeout_ms, 7_000);
        assert_eq!(config.similar_labs.fallback, SimilarFallback::Surface);
        Ok(())
    }

    #[test]
    fn env_wins_over_overrides_and_file() -> Result<(), ErrorEnvelope> {
        let env = ClientEnv {
            api_base_url: Some("https://env.example.com/".into()),
            ..ClientEnv::default()
        };

        let config = load_client_config_from_sources(
            Some(("[api]\nbaseUrl = \"http://file:8000\"\n", ConfigFormat::Toml)),
            Some(r#"{"api": {"baseUrl": "http://override:8000"}}"#),
            &env,
        )?;

        assert_eq!(config.api_base_url(), "https://env.example.com");
        Ok(())
    }

    #[test]
    fn unknown_override_keys_are_rejected() {
        let result = load_client_config_from_sources(
            None,
            Some(r#"{"api": {"apiKey": "x"}}"#),
            &ClientEnv::default(),
        );
        let source = result
            .err()
            .and_then(|error| error.metadata.get("source").cloned());
        assert_eq!(source.as_deref(), Some("overrides"));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            detect_config_format(Path::new("lab-finder.TOML")).ok(),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            detect_config_format(Path::new("lab-finder")).ok(),
            Some(ConfigFormat::Json)
        );
        assert!(detect_config_format(Path::new("lab-finder.yaml")).is_err());
    }
}
