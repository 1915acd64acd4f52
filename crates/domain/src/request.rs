//! Search request construction.

use crate::filters::SearchFilterState;
use lab_finder_shared::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use thiserror::Error;

/// Longest accepted query, in characters after trimming.
pub const MAX_QUERY_CHARS: usize = 500;
/// Largest accepted result limit.
pub const MAX_LIMIT: u32 = 100;
/// Result limit used when the caller does not choose one.
pub const DEFAULT_LIMIT: u32 = 20;

/// Local validation failures raised before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestValidationError {
    /// Query is empty or whitespace-only.
    #[error("search query must not be blank")]
    BlankQuery,
    /// Query exceeds [`MAX_QUERY_CHARS`].
    #[error("search query is {chars} characters long (max {max})", max = MAX_QUERY_CHARS)]
    QueryTooLong {
        /// Character count after trimming.
        chars: usize,
    },
    /// Limit is zero or above [`MAX_LIMIT`].
    #[error("limit must be between 1 and {max}, got {limit}", max = MAX_LIMIT)]
    LimitOutOfRange {
        /// Requested limit.
        limit: u32,
    },
}

impl RequestValidationError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::BlankQuery => ErrorCode::new("search", "blank_query"),
            Self::QueryTooLong { .. } => ErrorCode::new("search", "query_too_long"),
            Self::LimitOutOfRange { .. } => ErrorCode::new("search", "invalid_limit"),
        }
    }
}

impl From<RequestValidationError> for ErrorEnvelope {
    fn from(error: RequestValidationError) -> Self {
        let envelope = Self::validation(error.error_code(), error.to_string());
        match error {
            RequestValidationError::BlankQuery => envelope,
            RequestValidationError::QueryTooLong { chars } => {
                envelope.with_metadata("chars", chars.to_string())
            },
            RequestValidationError::LimitOutOfRange { limit } => {
                envelope.with_metadata("limit", limit.to_string())
            },
        }
    }
}

/// Immutable request for the ranked-search endpoint.
///
/// Only [`SearchRequest::build`] creates one, so the query is always
/// non-blank and trimmed, and empty filter lists are absent rather than `[]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    query: String,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    region_filter: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_filter: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_similarity: Option<f64>,
}

impl SearchRequest {
    /// Assemble a request from user input and the active filters.
    pub fn build(
        query: &str,
        filters: &SearchFilterState,
        limit: u32,
    ) -> Result<Self, RequestValidationError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RequestValidationError::BlankQuery);
        }
        let chars = query.chars().count();
        if chars > MAX_QUERY_CHARS {
            return Err(RequestValidationError::QueryTooLong { chars });
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(RequestValidationError::LimitOutOfRange { limit });
        }

        Ok(Self {
            query: query.to_string(),
            limit,
            region_filter: non_empty(filters.regions().iter()),
            field_filter: non_empty(filters.fields().iter()),
            min_similarity: Some(filters.min_similarity()),
        })
    }

    /// Trimmed query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Maximum number of results.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Region filter, absent when no region is selected.
    #[must_use]
    pub fn region_filter(&self) -> Option<&[String]> {
        self.region_filter.as_deref()
    }

    /// Field filter, absent when no field is selected.
    #[must_use]
    pub fn field_filter(&self) -> Option<&[String]> {
        self.field_filter.as_deref()
    }

    /// Minimum similarity threshold.
    #[must_use]
    pub const fn min_similarity(&self) -> Option<f64> {
        self.min_similarity
    }
}

fn non_empty<'a>(values: impl Iterator<Item = &'a String>) -> Option<Vec<String>> {
    let values: Vec<String> = values.cloned().collect();
    (!values.is_empty()).then_some(values)
}
