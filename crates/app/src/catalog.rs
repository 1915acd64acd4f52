//! Catalog lookups: suggestions, popular searches, filter choices, health.

use crate::deps::{LabFinderDeps, fields};
use lab_finder_domain::{HealthStatus, Suggestion};
use lab_finder_ports::SuggestionsRequest;
use lab_finder_shared::{ErrorEnvelope, RequestContext, Result};
use serde::Serialize;
use serde_json::Value;

/// Shorter inputs get no suggestions and issue no request.
pub const MIN_SUGGESTION_CHARS: usize = 3;

/// Region and research-field choices for the filter panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Known regions.
    pub regions: Vec<String>,
    /// Known research fields.
    pub research_fields: Vec<String>,
}

/// Completion candidates for a partially typed query.
pub async fn suggestions(
    ctx: &RequestContext,
    deps: &LabFinderDeps,
    query: &str,
    limit: u32,
) -> Result<Vec<Suggestion>> {
    let query = query.trim();
    if query.chars().count() < MIN_SUGGESTION_CHARS || limit == 0 {
        return Ok(Vec::new());
    }
    let request = SuggestionsRequest {
        query: query.into(),
        limit,
    };
    let result = deps
        .run_with_retry(ctx, "app.suggestions", || {
            deps.api.suggestions(ctx, request.clone())
        })
        .await;
    report(ctx, deps, "suggestions", result)
}

/// Most frequent queries, most popular first.
pub async fn popular_searches(
    ctx: &RequestContext,
    deps: &LabFinderDeps,
    limit: u32,
) -> Result<Vec<String>> {
    let result = deps
        .run_with_retry(ctx, "app.popular_searches", || {
            deps.api.popular_searches(ctx, limit)
        })
        .await;
    report(ctx, deps, "popular_searches", result)
}

/// Regions and research fields, fetched one after the other.
pub async fn filter_options(ctx: &RequestContext, deps: &LabFinderDeps) -> Result<FilterOptions> {
    let regions = deps
        .run_with_retry(ctx, "app.regions", || deps.api.regions(ctx))
        .await;
    let regions = report(ctx, deps, "regions", regions)?;
    let research_fields = deps
        .run_with_retry(ctx, "app.research_fields", || deps.api.research_fields(ctx))
        .await;
    let research_fields = report(ctx, deps, "research_fields", research_fields)?;
    Ok(FilterOptions {
        regions,
        research_fields,
    })
}

/// Backend health. Not retried: the answer is wanted now.
pub async fn health(ctx: &RequestContext, deps: &LabFinderDeps) -> Result<HealthStatus> {
    let result = deps.api.health(ctx).await;
    report(ctx, deps, "health", result)
}

fn report<T>(
    ctx: &RequestContext,
    deps: &LabFinderDeps,
    operation: &'static str,
    result: Result<T>,
) -> Result<T> {
    result.inspect_err(|error: &ErrorEnvelope| {
        deps.report_failure(
            "app.catalog",
            error,
            fields([
                ("correlationId", Value::from(ctx.correlation_id().as_str())),
                ("operation", Value::from(operation)),
            ]),
        );
    })
}
