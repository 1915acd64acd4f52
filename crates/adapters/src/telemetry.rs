//! Telemetry adapters: JSON lines for the CLI, in-memory counters for tests.

use crate::log_sink::LogSink;
use lab_finder_ports::{TelemetryPort, TelemetryTags, TelemetryTimer};
use lab_finder_shared::redaction::{REDACTED, is_secret_key};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Telemetry adapter that emits JSON lines.
#[derive(Clone)]
pub struct JsonTelemetry {
    sink: Arc<dyn LogSink>,
    base_tags: TelemetryTags,
}

impl JsonTelemetry {
    /// Create a telemetry adapter backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_tags: TelemetryTags::new(),
        }
    }

    /// Set base tags applied to every metric.
    #[must_use]
    pub fn with_base_tags(mut self, tags: TelemetryTags) -> Self {
        self.base_tags = tags;
        self
    }
}

impl TelemetryPort for JsonTelemetry {
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>) {
        let tags = merge_tags(&self.base_tags, tags);
        self.sink
            .write_line(&metric_line("counter", name, value, None, &tags));
    }

    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>) {
        let tags = merge_tags(&self.base_tags, tags);
        self.sink
            .write_line(&metric_line("timer", name, duration_ms, Some("ms"), &tags));
    }

    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(StopwatchTimer {
            telemetry: Arc::new(self.clone()),
            name: name.into(),
            tags: tags.cloned(),
            started_at: Instant::now(),
            stopped: AtomicBool::new(false),
        })
    }
}

/// Records counters and timer samples in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryTelemetry {
    metrics: Arc<MemoryMetrics>,
}

#[derive(Debug, Default)]
struct MemoryMetrics {
    counters: Mutex<BTreeMap<Box<str>, u64>>,
    timers: Mutex<BTreeMap<Box<str>, Vec<u64>>>,
}

impl MemoryTelemetry {
    /// Current value of a counter (0 when never incremented).
    pub fn counter(&self, name: &str) -> u64 {
        let counters = self
            .metrics
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        counters.get(name).copied().unwrap_or_default()
    }

    /// Number of samples recorded for a timer.
    pub fn timer_samples(&self, name: &str) -> usize {
        let timers = self
            .metrics
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        timers.get(name).map_or(0, Vec::len)
    }
}

impl TelemetryPort for MemoryTelemetry {
    fn increment_counter(&self, name: &str, value: u64, _tags: Option<&TelemetryTags>) {
        let mut counters = self
            .metrics
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = counters.entry(name.into()).or_default();
        *entry = entry.saturating_add(value);
    }

    fn record_timer_ms(&self, name: &str, duration_ms: u64, _tags: Option<&TelemetryTags>) {
        let mut timers = self
            .metrics
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        timers.entry(name.into()).or_default().push(duration_ms);
    }

    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(StopwatchTimer {
            telemetry: Arc::new(self.clone()),
            name: name.into(),
            tags: tags.cloned(),
            started_at: Instant::now(),
            stopped: AtomicBool::new(false),
        })
    }
}

struct StopwatchTimer {
    telemetry: Arc<dyn TelemetryPort>,
    name: Box<str>,
    tags: Option<TelemetryTags>,
    started_at: Instant,
    stopped: AtomicBool,
}

impl TelemetryTimer for StopwatchTimer {
    fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let duration_ms = u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or_default();
        self.telemetry
            .record_timer_ms(&self.name, duration_ms, self.tags.as_ref());
    }
}

fn metric_line(
    metric_type: &str,
    name: &str,
    value: u64,
    unit: Option<&str>,
    tags: &TelemetryTags,
) -> String {
    let mut payload = Map::new();
    payload.insert("type".to_string(), Value::from("metric"));
    payload.insert("timestampMs".to_string(), Value::from(now_epoch_ms()));
    payload.insert("metricType".to_string(), Value::from(metric_type));
    payload.insert("name".to_string(), Value::from(name));
    payload.insert("value".to_string(), Value::from(value));
    if let Some(unit) = unit {
        payload.insert("unit".to_string(), Value::from(unit));
    }
    if !tags.is_empty() {
        let rendered: Map<String, Value> = tags
            .iter()
            .map(|(key, value)| (key.to_string(), Value::from(value.as_ref())))
            .collect();
        payload.insert("tags".to_string(), Value::Object(rendered));
    }

    serde_json::to_string(&Value::Object(payload)).map_or_else(
        |_| {
            "{\"type\":\"metric\",\"metricType\":\"error\",\"name\":\"telemetry.serialize_failed\",\"value\":1}\n"
                .to_string()
        },
        |mut encoded| {
            encoded.push('\n');
            encoded
        },
    )
}

fn merge_tags(base: &TelemetryTags, extra: Option<&TelemetryTags>) -> TelemetryTags {
    let mut merged = base.clone();
    if let Some(extra) = extra {
        merged.extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
    }
    for (key, value) in &mut merged {
        if is_secret_key(key) {
            *value = REDACTED.into();
        }
    }
    merged
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}
