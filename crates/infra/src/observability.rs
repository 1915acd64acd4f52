//! Logger and telemetry selection from env switches.

use lab_finder_adapters::{JsonLogger, JsonTelemetry, LogSink, StderrLogSink};
use lab_finder_config::LogLevelName;
use lab_finder_ports::{LogFields, LogLevel, LoggerPort, TelemetryPort, TelemetryTags};
use lab_finder_shared::RequestContext;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Env switch enabling JSON logs on stderr.
pub const LOG_FORMAT_ENV: &str = "LAB_FINDER_LOG_FORMAT";
/// Env switch enabling JSON telemetry on stderr. Defaults to the log switch.
pub const TELEMETRY_FORMAT_ENV: &str = "LAB_FINDER_TELEMETRY_FORMAT";

/// Structured logger and telemetry for one client session.
#[derive(Clone, Default)]
pub struct Observability {
    /// Logger, when JSON logs are enabled.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Telemetry, when JSON metrics are enabled.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

impl Observability {
    /// Disabled logger and telemetry.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Read the format switches from the process env.
    #[must_use]
    pub fn from_env(level: LogLevelName) -> Self {
        let env: BTreeMap<String, String> = [LOG_FORMAT_ENV, TELEMETRY_FORMAT_ENV]
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| ((*key).to_string(), value)))
            .collect();
        Self::from_map(&env, level, Arc::new(StderrLogSink))
    }

    /// Read the format switches from an env snapshot, writing to `sink`.
    #[must_use]
    pub fn from_map(
        env: &BTreeMap<String, String>,
        level: LogLevelName,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        let log_enabled = is_json(env.get(LOG_FORMAT_ENV));
        let telemetry_enabled = env
            .get(TELEMETRY_FORMAT_ENV)
            .map_or(log_enabled, |value| value.eq_ignore_ascii_case("json"));

        let logger: Option<Arc<dyn LoggerPort>> = if log_enabled {
            Some(Arc::new(
                JsonLogger::new(Arc::clone(&sink)).with_min_level(log_level(level)),
            ))
        } else {
            None
        };
        let telemetry: Option<Arc<dyn TelemetryPort>> = if telemetry_enabled {
            let mut tags = TelemetryTags::new();
            tags.insert("client".into(), "lab-finder".into());
            Some(Arc::new(
                JsonTelemetry::new(Arc::clone(&sink)).with_base_tags(tags),
            ))
        } else {
            None
        };

        Self { logger, telemetry }
    }

    /// Logger with the request's correlation id attached to every event.
    #[must_use]
    pub fn scope_logger(&self, ctx: &RequestContext) -> Option<Arc<dyn LoggerPort>> {
        let logger = self.logger.as_ref()?;
        let mut fields = LogFields::new();
        fields.insert(
            "correlationId".to_owned().into_boxed_str(),
            Value::String(ctx.correlation_id().as_str().to_string()),
        );
        Some(Arc::from(logger.child(fields)))
    }
}

fn is_json(value: Option<&String>) -> bool {
    value.is_some_and(|value| value.eq_ignore_ascii_case("json"))
}

const fn log_level(level: LogLevelName) -> LogLevel {
    match level {
        LogLevelName::Debug => LogLevel::Debug,
        LogLevelName::Info => LogLevel::Info,
        LogLevelName::Warn => LogLevel::Warn,
        LogLevelName::Error => LogLevel::Error,
    }
}
