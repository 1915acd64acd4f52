//! Catalog lookups and service health.

use serde::Serialize;

/// A query completion offered while the user types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// Suggested query text.
    pub text: String,
    /// Where the suggestion came from (field, keyword, lab name, ...).
    pub category: String,
}

/// Response of the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// `"healthy"` when the service is up.
    pub status: String,
    /// Free-form status message.
    pub message: String,
    /// Service version.
    pub version: String,
}

impl HealthStatus {
    /// True when the service reports itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_is_case_insensitive() {
        let status = HealthStatus {
            status: "Healthy".to_string(),
            message: "ok".to_string(),
            version: "1.0.0".to_string(),
        };
        assert!(status.is_healthy());
        assert!(
            !HealthStatus {
                status: "degraded".to_string(),
                ..status
            }
            .is_healthy()
        );
    }
}
