//! Ranked lab search use case.

use crate::deps::{LabFinderDeps, duration_ms, fields};
use lab_finder_domain::{RequestValidationError, SearchFilterState, SearchRequest, SearchResponse};
use lab_finder_ports::LogFields;
use lab_finder_shared::{ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::time::Instant;

/// Input payload for a lab search.
#[derive(Debug, Clone)]
pub struct SearchLabsInput {
    /// Free-text query as typed.
    pub query: Box<str>,
    /// Active filters.
    pub filters: SearchFilterState,
    /// Maximum number of results.
    pub limit: u32,
}

impl SearchLabsInput {
    /// Build the wire request. Fails without touching the network.
    pub fn to_request(&self) -> std::result::Result<SearchRequest, RequestValidationError> {
        SearchRequest::build(&self.query, &self.filters, self.limit)
    }
}

/// Execute a ranked search.
///
/// Blank or oversized queries fail with a `Validation` error before any
/// request is issued. Retriable failures are retried with `deps.retry`.
pub async fn search_labs(
    ctx: &RequestContext,
    deps: &LabFinderDeps,
    input: SearchLabsInput,
) -> Result<SearchResponse> {
    let request = input.to_request().map_err(ErrorEnvelope::from)?;

    let started_at = Instant::now();
    let timer = deps
        .telemetry
        .as_ref()
        .map(|telemetry| telemetry.start_timer("app.search.total", None));
    deps.info(
        "app.search.start",
        "Lab search started",
        log_fields_start(ctx, &request),
    );

    let result = deps
        .run_with_retry(ctx, "app.search", || deps.api.search(ctx, request.clone()))
        .await;

    if let Some(timer) = timer.as_ref() {
        timer.stop();
    }

    match result {
        Ok(response) => {
            deps.count("app.search.completed", None);
            let mut completed = log_fields_start(ctx, &request);
            completed.insert("durationMs".into(), Value::from(duration_ms(started_at)));
            completed.insert("results".into(), Value::from(response.results.len()));
            completed.insert("totalResults".into(), Value::from(response.total_results));
            deps.info("app.search.completed", "Lab search completed", completed);
            Ok(response)
        },
        Err(error) => {
            let mut failed = log_fields_start(ctx, &request);
            failed.insert("durationMs".into(), Value::from(duration_ms(started_at)));
            deps.report_failure("app.search", &error, failed);
            Err(error)
        },
    }
}

fn log_fields_start(ctx: &RequestContext, request: &SearchRequest) -> LogFields {
    fields([
        ("correlationId", Value::from(ctx.correlation_id().as_str())),
        ("query", Value::from(request.query())),
        ("limit", Value::from(request.limit())),
        ("regions", Value::from(request.region_filter().map_or(0, <[String]>::len))),
        ("fields", Value::from(request.field_filter().map_or(0, <[String]>::len))),
        ("minSimilarity", Value::from(request.min_similarity())),
    ])
}
