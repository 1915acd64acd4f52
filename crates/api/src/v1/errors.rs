//! Error-body parsing and error DTO mapping.

use crate::v1::{ApiV1ErrorDto, ApiV1ErrorKind, ApiV1ErrorMeta};
use lab_finder_shared::{ErrorCode, ErrorEnvelope, ErrorKind, redact_if_secret};
use serde_json::Value;

/// Extract a human-readable message from a non-2xx response body.
///
/// Understands the backend's two envelopes:
/// - `{"detail": "..."}`, or on 422 `{"detail": [{"msg": "...", ...}]}`
/// - `{"error": "...", "message": "...", "details": {...}}`
///
/// Returns `None` when the body matches neither.
#[must_use]
pub fn error_message_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;

    if let Some(detail) = object.get("detail") {
        if let Some(message) = detail_message(detail) {
            return Some(message);
        }
    }
    ["message", "error"]
        .iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(text) => non_blank(text),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(text) => non_blank(text),
                    Value::Object(fields) => fields
                        .get("msg")
                        .and_then(Value::as_str)
                        .and_then(non_blank)
                        .map(|msg| match validation_location(fields.get("loc")) {
                            Some(location) => format!("{location}: {msg}"),
                            None => msg,
                        }),
                    _ => None,
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        },
        _ => None,
    }
}

// FastAPI locations look like ["body", "query"]; the leading "body" is noise.
fn validation_location(loc: Option<&Value>) -> Option<String> {
    let parts: Vec<String> = loc?
        .as_array()?
        .iter()
        .filter_map(|part| match part {
            Value::String(text) if text != "body" => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("."))
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Convert a shared `ErrorCode` into an API v1 error code string.
#[must_use]
pub fn error_code_to_api_v1(code: &ErrorCode) -> String {
    let namespace = sanitize_code_segment(code.namespace());
    let detail = sanitize_code_segment(code.code());
    format!("ERR_{namespace}_{detail}")
}

/// Map an `ErrorEnvelope` into an error DTO with secrets redacted.
#[must_use]
pub fn error_envelope_to_api_v1_error(envelope: &ErrorEnvelope) -> ApiV1ErrorDto {
    let meta: ApiV1ErrorMeta = envelope
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), redact_if_secret(key, value)))
        .collect();

    ApiV1ErrorDto {
        code: error_code_to_api_v1(&envelope.code),
        message: envelope.message.clone(),
        kind: map_error_kind(envelope.kind),
        status: envelope.status,
        retriable: envelope.class.is_retriable(),
        meta: (!meta.is_empty()).then_some(meta),
    }
}

const fn map_error_kind(kind: ErrorKind) -> ApiV1ErrorKind {
    match kind {
        ErrorKind::Validation => ApiV1ErrorKind::Validation,
        ErrorKind::Network => ApiV1ErrorKind::Network,
        ErrorKind::Service => ApiV1ErrorKind::Service,
        ErrorKind::NotFound => ApiV1ErrorKind::NotFound,
        ErrorKind::Cancelled => ApiV1ErrorKind::Cancelled,
        ErrorKind::Internal => ApiV1ErrorKind::Internal,
    }
}

fn sanitize_code_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_extracted() {
        let body = br#"{"detail": "Lab not found"}"#;
        assert_eq!(error_message_from_body(body).as_deref(), Some("Lab not found"));
    }

    #[test]
    fn validation_detail_list_is_joined() {
        let body = br#"{"detail": [
            {"loc": ["body", "query"], "msg": "field required", "type": "value_error.missing"},
            {"loc": ["body", "limit"], "msg": "ensure this value is less than or equal to 100"}
        ]}"#;
        assert_eq!(
            error_message_from_body(body).as_deref(),
            Some("query: field required; limit: ensure this value is less than or equal to 100")
        );
    }

    #[test]
    fn error_response_envelope_prefers_message() {
        let body = br#"{"error": "SearchError", "message": "embedding service unavailable"}"#;
        assert_eq!(
            error_message_from_body(body).as_deref(),
            Some("embedding service unavailable")
        );
        let body = br#"{"error": "SearchError"}"#;
        assert_eq!(error_message_from_body(body).as_deref(), Some("SearchError"));
    }

    #[test]
    fn unknown_bodies_yield_none() {
        assert_eq!(error_message_from_body(b"<html>502 Bad Gateway</html>"), None);
        assert_eq!(error_message_from_body(br#"{"detail": ""}"#), None);
        assert_eq!(error_message_from_body(br#"["detail"]"#), None);
    }

    #[test]
    fn error_dto_redacts_secrets_and_keeps_status() {
        let envelope = ErrorEnvelope::service(503, "unavailable")
            .with_metadata("authorization", "Bearer abc")
            .with_metadata("operation", "search");

        let dto = error_envelope_to_api_v1_error(&envelope);

        assert_eq!(dto.code, "ERR_HTTP_SERVICE");
        assert_eq!(dto.kind, ApiV1ErrorKind::Service);
        assert_eq!(dto.status, Some(503));
        assert!(dto.retriable);
        let meta = dto.meta.unwrap_or_default();
        assert_eq!(meta.get("authorization").map(String::as_str), Some("[REDACTED]"));
        assert_eq!(meta.get("operation").map(String::as_str), Some("search"));
    }
}
