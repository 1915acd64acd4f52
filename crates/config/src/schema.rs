//! Client configuration schema.
//!
//! Raw [`ClientConfig`] values are what files, overrides and env produce.
//! Only a [`ValidatedClientConfig`] reaches the composition root.

use lab_finder_domain::MAX_LIMIT;
use lab_finder_shared::{ErrorCode, ErrorEnvelope, RetryPolicy, strip_url_credentials};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Default backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

const API_TIMEOUT_MIN_MS: u64 = 1_000;
const API_TIMEOUT_MAX_MS: u64 = 120_000;
const RETRY_MAX_ATTEMPTS_MIN: u32 = 1;
const RETRY_MAX_ATTEMPTS_MAX: u32 = 10;
const RETRY_DELAY_MAX_MS: u64 = 60_000;
const RETRY_JITTER_MAX_PCT: u32 = 100;
const SEARCH_LIMIT_MIN: u32 = 1;
const SIMILAR_LIMIT_MAX: u32 = 50;

/// What to show when similar labs cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarFallback {
    /// Substitute the labelled fallback set.
    #[default]
    Degraded,
    /// Surface the failure to the caller.
    Surface,
}

impl SimilarFallback {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Degraded => "degraded",
            Self::Surface => "surface",
        }
    }
}

impl FromStr for SimilarFallback {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "degraded" => Ok(Self::Degraded),
            "surface" => Ok(Self::Surface),
            other => Err(format!("unknown similar-labs fallback: {other}")),
        }
    }
}

/// Minimum log level for emitted events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevelName {
    /// Debug.
    Debug,
    /// Info.
    #[default]
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
}

impl LogLevelName {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevelName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ClientConfig {
    /// Schema version.
    pub version: u32,
    /// Backend connection.
    pub api: ApiConfig,
    /// Retry policy for retriable failures.
    pub retry: RetryConfig,
    /// Search limits.
    pub search: SearchConfig,
    /// Similar-labs behaviour.
    pub similar_labs: SimilarLabsConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
            search: SearchConfig::default(),
            similar_labs: SimilarLabsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ApiConfig {
    /// Base URL of the ranked-search service.
    pub base_url: Box<str>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            timeout_ms: 10_000,
        }
    }
}

/// Retry settings. `maxAttempts` counts the first try.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RetryConfig {
    /// Maximum attempts, including the first try.
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds.
    pub base_delay_ms: u64,
    /// Backoff cap in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter ratio as a percentage.
    pub jitter_ratio_pct: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay_ms,
            max_delay_ms: policy.max_delay_ms,
            jitter_ratio_pct: policy.jitter_ratio_pct,
        }
    }
}

/// Search limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SearchConfig {
    /// Result limit when the caller does not pass one.
    pub default_limit: u32,
    /// Number of similar labs to request.
    pub similar_limit: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: lab_finder_domain::DEFAULT_LIMIT,
            similar_limit: 5,
        }
    }
}

/// Similar-labs behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SimilarLabsConfig {
    /// Policy when the similar-labs request fails.
    pub fallback: SimilarFallback,
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Minimum level for emitted events.
    pub level: LogLevelName,
}

/// Config that passed validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedClientConfig(ClientConfig);

impl ValidatedClientConfig {
    /// Borrow the inner config.
    #[must_use]
    pub const fn as_config(&self) -> &ClientConfig {
        &self.0
    }

    /// Unwrap into the raw config (for further merging).
    #[must_use]
    pub fn into_inner(self) -> ClientConfig {
        self.0
    }

    /// Normalized base URL, without a trailing slash.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.0.api.base_url
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.0.api.timeout_ms)
    }

    /// Retry policy for use cases.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.0.retry.max_attempts,
            base_delay_ms: self.0.retry.base_delay_ms,
            max_delay_ms: self.0.retry.max_delay_ms,
            jitter_ratio_pct: self.0.retry.jitter_ratio_pct,
        }
    }
}

impl Deref for ValidatedClientConfig {
    type Target = ClientConfig;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ClientConfig {
    /// Validate ranges and normalize the base URL.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedClientConfig, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }

        self.api.base_url = normalize_base_url(&self.api.base_url)?;
        if !(API_TIMEOUT_MIN_MS..=API_TIMEOUT_MAX_MS).contains(&self.api.timeout_ms) {
            return Err(ConfigSchemaError::TimeoutOutOfRange {
                section: "api",
                field: "timeoutMs",
                value_ms: self.api.timeout_ms,
                min_ms: API_TIMEOUT_MIN_MS,
                max_ms: API_TIMEOUT_MAX_MS,
            });
        }

        validate_limit(
            "retry",
            "maxAttempts",
            self.retry.max_attempts,
            RETRY_MAX_ATTEMPTS_MIN,
            RETRY_MAX_ATTEMPTS_MAX,
        )?;
        validate_limit(
            "retry",
            "jitterRatioPct",
            self.retry.jitter_ratio_pct,
            0,
            RETRY_JITTER_MAX_PCT,
        )?;
        if self.retry.max_delay_ms > RETRY_DELAY_MAX_MS {
            return Err(ConfigSchemaError::TimeoutOutOfRange {
                section: "retry",
                field: "maxDelayMs",
                value_ms: self.retry.max_delay_ms,
                min_ms: 0,
                max_ms: RETRY_DELAY_MAX_MS,
            });
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigSchemaError::RetryDelaysInverted {
                base_delay_ms: self.retry.base_delay_ms,
                max_delay_ms: self.retry.max_delay_ms,
            });
        }

        validate_limit(
            "search",
            "defaultLimit",
            self.search.default_limit,
            SEARCH_LIMIT_MIN,
            MAX_LIMIT,
        )?;
        validate_limit(
            "search",
            "similarLimit",
            self.search.similar_limit,
            SEARCH_LIMIT_MIN,
            SIMILAR_LIMIT_MAX,
        )?;

        Ok(ValidatedClientConfig(self))
    }
}

fn validate_limit(
    section: &'static str,
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<(), ConfigSchemaError> {
    if (min..=max).contains(&value) {
        return Ok(());
    }
    Err(ConfigSchemaError::LimitOutOfRange {
        section,
        field,
        value: u64::from(value),
        min: u64::from(min),
        max: u64::from(max),
    })
}

fn normalize_base_url(raw: &str) -> Result<Box<str>, ConfigSchemaError> {
    let invalid = |reason: &str| ConfigSchemaError::InvalidUrl {
        section: "api",
        field: "baseUrl",
        url: strip_url_credentials(raw),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("must be non-empty"));
    }
    let parsed = Url::parse(trimmed).map_err(|error| invalid(&error.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment"));
    }

    Ok(trimmed.trim_end_matches('/').into())
}

/// Parse a client config from JSON, applying validation and normalization.
pub fn parse_client_config_json(input: &str) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let config: ClientConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::validation(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a client config from TOML, applying validation and normalization.
pub fn parse_client_config_toml(input: &str) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let config: ClientConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::validation(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Validation failures for the config schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A duration is out of bounds.
    TimeoutOutOfRange {
        /// Schema section (e.g. `api`).
        section: &'static str,
        /// Field name (e.g. `timeoutMs`).
        field: &'static str,
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// A numeric limit is out of bounds.
    LimitOutOfRange {
        /// Schema section (e.g. `search`).
        section: &'static str,
        /// Field name (e.g. `defaultLimit`).
        field: &'static str,
        /// Value provided.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
    /// `retry.baseDelayMs` exceeds `retry.maxDelayMs`.
    RetryDelaysInverted {
        /// Base delay (ms).
        base_delay_ms: u64,
        /// Delay cap (ms).
        max_delay_ms: u64,
    },
    /// A URL entry is invalid.
    InvalidUrl {
        /// Schema section.
        section: &'static str,
        /// Field name.
        field: &'static str,
        /// The URL with credentials stripped.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::TimeoutOutOfRange { .. } => ErrorCode::new("config", "timeout_out_of_range"),
            Self::LimitOutOfRange { .. } => ErrorCode::new("config", "limit_out_of_range"),
            Self::RetryDelaysInverted { .. } => ErrorCode::new("config", "retry_delays_inverted"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_url"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "unsupported config version {found} (supported: {supported})"
            ),
            Self::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be within {min_ms}..={max_ms} ms (got {value_ms})"
            ),
            Self::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => write!(
                formatter,
                "{section}.{field} must be within {min}..={max} (got {value})"
            ),
            Self::RetryDelaysInverted {
                base_delay_ms,
                max_delay_ms,
            } => write!(
                formatter,
                "retry.baseDelayMs ({base_delay_ms}) must not exceed retry.maxDelayMs ({max_delay_ms})"
            ),
            Self::InvalidUrl {
                section,
                field,
                url,
                reason,
            } => write!(formatter, "{section}.{field} is invalid ({url}): {reason}"),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::validation(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("min_ms", min_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
            ConfigSchemaError::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::RetryDelaysInverted {
                base_delay_ms,
                max_delay_ms,
            } => envelope
                .with_metadata("base_delay_ms", base_delay_ms.to_string())
                .with_metadata("max_delay_ms", max_delay_ms.to_string()),
            ConfigSchemaError::InvalidUrl {
                section, field, url, ..
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("url", url),
        }
    }
}
