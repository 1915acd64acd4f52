//! Dependencies shared by every use case, plus the logging/metrics helpers
//! they report through.

use lab_finder_ports::{LabApiPort, LogFields, LoggerPort, TelemetryPort, TelemetryTags};
use lab_finder_shared::{ErrorEnvelope, RequestContext, Result, RetryPolicy, retry_async_with_observer};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Dependencies required by the lab-finder use cases.
#[derive(Clone)]
pub struct LabFinderDeps {
    /// Backend adapter.
    pub api: Arc<dyn LabApiPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
    /// Backoff applied to retriable failures.
    pub retry: RetryPolicy,
}

impl LabFinderDeps {
    /// Dependencies with no logger, no telemetry and the default retry policy.
    #[must_use]
    pub fn new(api: Arc<dyn LabApiPort>) -> Self {
        Self {
            api,
            logger: None,
            telemetry: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Attach a logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Attach a telemetry sink.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetryPort>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn count(&self, name: &str, tags: Option<&TelemetryTags>) {
        if let Some(telemetry) = self.telemetry.as_ref() {
            telemetry.increment(name, tags);
        }
    }

    pub(crate) fn info(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger.as_ref() {
            logger.info(event, message, Some(fields));
        }
    }

    pub(crate) fn warn(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger.as_ref() {
            logger.warn(event, message, Some(fields));
        }
    }

    /// Report a failed call: cancellations are `aborted`, everything else `failed`.
    pub(crate) fn report_failure(&self, prefix: &str, error: &ErrorEnvelope, fields: LogFields) {
        if error.is_cancelled() {
            let event = format!("{prefix}.aborted");
            self.count(&event, None);
            self.info(&event, "Request aborted", fields);
            return;
        }
        let event = format!("{prefix}.failed");
        self.count(&event, Some(&tags(&[("kind", error.kind.as_str())])));
        if let Some(logger) = self.logger.as_ref() {
            logger.error(&event, error, Some(fields));
        }
    }

    /// Run `op` under the configured retry policy.
    pub(crate) async fn run_with_retry<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        mut op: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        retry_async_with_observer(ctx, self.retry, operation, &mut op, |attempt, error| {
            tracing::debug!(operation, attempt, code = %error.code, "retrying after failure");
            self.count("app.retry", Some(&tags(&[("operation", operation)])));
        })
        .await
    }
}

pub(crate) fn fields(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> LogFields {
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value))
        .collect()
}

pub(crate) fn tags(pairs: &[(&str, &str)]) -> TelemetryTags {
    pairs
        .iter()
        .map(|(key, value)| ((*key).into(), (*value).into()))
        .collect()
}

pub(crate) fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}
