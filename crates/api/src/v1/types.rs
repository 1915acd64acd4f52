//! API v1 DTO types.
//!
//! Request and resource DTOs mirror the backend's snake_case JSON. Search
//! results are not listed here: their shapes vary, so they are read from
//! `serde_json::Value` in `results.rs`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /api/search/`.
///
/// Empty filter lists are never sent; the backend reads "absent" as
/// "no filter".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiV1SearchRequestDto {
    /// Trimmed query text.
    pub query: String,
    /// Maximum number of results.
    pub limit: u32,
    /// Regions to keep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_filter: Option<Vec<String>>,
    /// Research fields to keep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_filter: Option<Vec<String>>,
    /// Minimum similarity threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_similarity: Option<f64>,
}

/// University nested inside a lab detail response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiV1UniversityDto {
    /// Backend identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// National, public or private.
    #[serde(rename = "type")]
    pub university_type: String,
    /// Prefecture.
    pub prefecture: String,
    /// Region.
    pub region: String,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of `GET /api/labs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiV1ResearchLabDto {
    /// Backend identifier.
    pub id: i64,
    /// Lab name.
    pub name: String,
    /// Head of the lab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professor_name: Option<String>,
    /// Department.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Research theme.
    pub research_theme: String,
    /// Research content.
    pub research_content: String,
    /// Research field.
    pub research_field: String,
    /// Speciality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    /// Comma-separated keywords.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Lab homepage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_url: Option<String>,
    /// Owning university.
    pub university: ApiV1UniversityDto,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Element of `GET /api/search/suggestions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiV1SuggestionDto {
    /// Suggested query text.
    pub text: String,
    /// Suggestion source.
    #[serde(default)]
    pub category: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiV1HealthDto {
    /// `"healthy"` when up.
    pub status: String,
    /// Status message.
    #[serde(default)]
    pub message: String,
    /// Service version.
    #[serde(default)]
    pub version: String,
}

/// Error kind exposed in CLI/API error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiV1ErrorKind {
    /// Bad local input.
    Validation,
    /// No response reached the client.
    Network,
    /// Non-2xx response.
    Service,
    /// 404 on a resource lookup.
    NotFound,
    /// Cancelled before completion.
    Cancelled,
    /// Client-side bug or undecodable payload.
    Internal,
}

/// Metadata map attached to API v1 errors.
pub type ApiV1ErrorMeta = BTreeMap<String, String>;

/// Error payload rendered for callers of the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1ErrorDto {
    /// Stable error code (e.g. `ERR_HTTP_NOT_FOUND`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Taxonomy bucket.
    pub kind: ApiV1ErrorKind,
    /// HTTP status, when the service answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Whether re-issuing the same request may succeed.
    pub retriable: bool,
    /// Diagnostic metadata with secrets redacted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApiV1ErrorMeta>,
}
