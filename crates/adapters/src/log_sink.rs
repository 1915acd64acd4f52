//! Line sinks shared by the JSON logger and JSON telemetry.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// A sink that receives pre-formatted, newline-terminated lines.
pub trait LogSink: Send + Sync {
    /// Write a line to the sink.
    fn write_line(&self, line: &str);
}

/// Sink that writes to stderr, keeping stdout free for command output.
#[derive(Debug, Default)]
pub struct StderrLogSink;

impl LogSink for StderrLogSink {
    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        // A closed stderr has nowhere left to report to.
        let _ = stderr.write_all(line.as_bytes());
    }
}

/// Sink that buffers lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    /// Drain the buffered lines.
    pub fn take(&self) -> Vec<String> {
        let mut guard = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }

    /// Parse buffered lines as JSON without draining them. Unparseable lines are skipped.
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        let guard = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .iter()
            .filter_map(|line| serde_json::from_str(line.trim()).ok())
            .collect()
    }
}

impl LogSink for MemoryLogSink {
    fn write_line(&self, line: &str) {
        let mut guard = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        guard.push(line.to_string());
    }
}
