//! In-memory lab API with scripted latency and failures.
//!
//! Used by use-case tests and offline demos. Search behaves like the backend
//! at the contract level: text match, then region/field/similarity filters,
//! then `limit`.

use lab_finder_ports::{
    BoxFuture, HealthStatus, LabApiPort, ResearchLab, SearchRequest, SearchResponse,
    SearchResultRecord, SimilarLabsRequest, Suggestion, SuggestionsRequest,
};
use lab_finder_shared::{ErrorEnvelope, RequestContext, Result};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct ScriptedFailure {
    error: ErrorEnvelope,
    remaining: Option<u32>,
}

/// Scripted in-memory implementation of [`LabApiPort`].
#[derive(Debug, Default)]
pub struct FixedLabApi {
    results: Vec<SearchResultRecord>,
    labs: BTreeMap<i64, ResearchLab>,
    similar: BTreeMap<i64, Vec<SearchResultRecord>>,
    suggestions: Vec<Suggestion>,
    popular: Vec<String>,
    regions: Vec<String>,
    research_fields: Vec<String>,
    search_delays: BTreeMap<String, Duration>,
    failures: Mutex<BTreeMap<&'static str, ScriptedFailure>>,
    calls: Mutex<BTreeMap<&'static str, usize>>,
}

/// Operation names accepted by [`FixedLabApi::fail`] and [`FixedLabApi::calls`].
pub mod operation {
    /// `search`.
    pub const SEARCH: &str = "search";
    /// `lab_detail`.
    pub const LAB_DETAIL: &str = "lab_detail";
    /// `similar_labs`.
    pub const SIMILAR_LABS: &str = "similar_labs";
    /// `suggestions`.
    pub const SUGGESTIONS: &str = "suggestions";
    /// `popular_searches`.
    pub const POPULAR_SEARCHES: &str = "popular_searches";
    /// `regions`.
    pub const REGIONS: &str = "regions";
    /// `research_fields`.
    pub const RESEARCH_FIELDS: &str = "research_fields";
    /// `health`.
    pub const HEALTH: &str = "health";
}

impl FixedLabApi {
    /// Empty API: every search returns no results, every lab lookup 404s.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Searchable records, in rank order.
    #[must_use]
    pub fn with_results(mut self, results: Vec<SearchResultRecord>) -> Self {
        self.results = results;
        self
    }

    /// Add a lab that `lab_detail` can return.
    #[must_use]
    pub fn with_lab(mut self, lab: ResearchLab) -> Self {
        self.labs.insert(lab.id, lab);
        self
    }

    /// Similar labs for `lab_id`. Unknown ids fail with `NotFound`.
    #[must_use]
    pub fn with_similar(mut self, lab_id: i64, labs: Vec<SearchResultRecord>) -> Self {
        self.similar.insert(lab_id, labs);
        self
    }

    /// Completion candidates; filtered by prefix at query time.
    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<Suggestion>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Popular queries, most frequent first.
    #[must_use]
    pub fn with_popular(mut self, popular: Vec<String>) -> Self {
        self.popular = popular;
        self
    }

    /// Region and research-field filter choices.
    #[must_use]
    pub fn with_catalog(mut self, regions: Vec<String>, research_fields: Vec<String>) -> Self {
        self.regions = regions;
        self.research_fields = research_fields;
        self
    }

    /// Delay responses to searches for `query` (exact, trimmed match).
    #[must_use]
    pub fn with_search_delay(mut self, query: &str, delay: Duration) -> Self {
        self.search_delays.insert(query.trim().to_string(), delay);
        self
    }

    /// Fail `operation` with `error`, for the next `times` calls or forever.
    pub fn fail(&self, operation: &'static str, error: ErrorEnvelope, times: Option<u32>) {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        failures.insert(
            operation,
            ScriptedFailure {
                error,
                remaining: times,
            },
        );
    }

    /// Number of calls made to `operation` so far.
    #[must_use]
    pub fn calls(&self, operation: &'static str) -> usize {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(operation).copied().unwrap_or_default()
    }

    fn enter(&self, ctx: &RequestContext, operation: &'static str) -> Result<()> {
        {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            *calls.entry(operation).or_default() += 1;
        }
        ctx.ensure_not_cancelled(operation)?;

        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(failure) = failures.get_mut(operation) else {
            return Ok(());
        };
        let error = failure.error.clone();
        match failure.remaining {
            None => Err(error),
            Some(0) => {
                failures.remove(operation);
                Ok(())
            },
            Some(remaining) => {
                if remaining == 1 {
                    failures.remove(operation);
                } else {
                    failure.remaining = Some(remaining - 1);
                }
                Err(error)
            },
        }
    }

    fn run_search(&self, request: &SearchRequest) -> Vec<SearchResultRecord> {
        let needle = request.query().to_lowercase();
        let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        self.results
            .iter()
            .filter(|record| text_matches(record, &needle))
            .filter(|record| {
                request
                    .region_filter()
                    .is_none_or(|regions| regions.contains(&record.region))
            })
            .filter(|record| {
                request
                    .field_filter()
                    .is_none_or(|fields| fields.contains(&record.research_field))
            })
            .filter(|record| {
                request
                    .min_similarity()
                    .is_none_or(|min| record.similarity_score >= min)
            })
            .take(limit)
            .cloned()
            .collect()
    }
}

fn text_matches(record: &SearchResultRecord, needle: &str) -> bool {
    [
        Some(record.name.as_str()),
        Some(record.research_theme.as_str()),
        Some(record.research_content.as_str()),
        Some(record.research_field.as_str()),
        record.keywords.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|text| text.to_lowercase().contains(needle))
}

fn take_limit<T: Clone>(items: &[T], limit: u32) -> Vec<T> {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    items.iter().take(limit).cloned().collect()
}

impl LabApiPort for FixedLabApi {
    fn search(
        &self,
        ctx: &RequestContext,
        request: SearchRequest,
    ) -> BoxFuture<'_, Result<SearchResponse>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let started = Instant::now();
            self.enter(&ctx, operation::SEARCH)?;
            if let Some(delay) = self.search_delays.get(request.query()).copied() {
                tokio::select! {
                    () = ctx.cancelled() => {
                        return Err(ErrorEnvelope::cancelled("request cancelled")
                            .with_metadata("operation", operation::SEARCH));
                    },
                    () = tokio::time::sleep(delay) => {},
                }
            }

            let results = self.run_search(&request);
            Ok(SearchResponse {
                query: request.query().to_string(),
                total_results: results.len() as u64,
                search_time_ms: started.elapsed().as_secs_f64() * 1_000.0,
                results,
            })
        })
    }

    fn lab_detail(&self, ctx: &RequestContext, lab_id: i64) -> BoxFuture<'_, Result<ResearchLab>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, operation::LAB_DETAIL)?;
            self.labs
                .get(&lab_id)
                .cloned()
                .ok_or_else(|| ErrorEnvelope::not_found(format!("lab {lab_id} not found")))
        })
    }

    fn similar_labs(
        &self,
        ctx: &RequestContext,
        request: SimilarLabsRequest,
    ) -> BoxFuture<'_, Result<Vec<SearchResultRecord>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, operation::SIMILAR_LABS)?;
            self.similar
                .get(&request.lab_id)
                .map(|labs| take_limit(labs, request.limit))
                .ok_or_else(|| {
                    ErrorEnvelope::not_found(format!(
                        "no similar labs for lab {}",
                        request.lab_id
                    ))
                })
        })
    }

    fn suggestions(
        &self,
        ctx: &RequestContext,
        request: SuggestionsRequest,
    ) -> BoxFuture<'_, Result<Vec<Suggestion>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, operation::SUGGESTIONS)?;
            let prefix = request.query.trim().to_lowercase();
            let matching: Vec<Suggestion> = self
                .suggestions
                .iter()
                .filter(|suggestion| suggestion.text.to_lowercase().contains(&prefix))
                .cloned()
                .collect();
            Ok(take_limit(&matching, request.limit))
        })
    }

    fn popular_searches(
        &self,
        ctx: &RequestContext,
        limit: u32,
    ) -> BoxFuture<'_, Result<Vec<String>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, operation::POPULAR_SEARCHES)?;
            Ok(take_limit(&self.popular, limit))
        })
    }

    fn regions(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<String>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, operation::REGIONS)?;
            Ok(self.regions.clone())
        })
    }

    fn research_fields(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<String>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, operation::RESEARCH_FIELDS)?;
            Ok(self.research_fields.clone())
        })
    }

    fn health(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<HealthStatus>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.enter(&ctx, operation::HEALTH)?;
            Ok(HealthStatus {
                status: "healthy".to_string(),
                message: "in-memory lab api".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_finder_domain::{RawSearchResult, SearchFilterState, normalize};
    use lab_finder_shared::ErrorKind;

    fn record(id: i64, name: &str, region: &str, score: f64) -> SearchResultRecord {
        normalize(RawSearchResult {
            id: Some(id),
            name: Some(name.to_string()),
            region: Some(region.to_string()),
            research_field: Some("Immunology".to_string()),
            similarity_score: Some(score),
            ..RawSearchResult::default()
        })
    }

    #[tokio::test]
    async fn search_applies_request_filters_in_rank_order() -> Result<()> {
        let api = FixedLabApi::new().with_results(vec![
            record(1, "Immunology Lab A", "Kanto", 0.9),
            record(2, "Immunology Lab B", "Kansai", 0.8),
            record(3, "Immunology Lab C", "Kanto", 0.2),
        ]);
        let mut filters = SearchFilterState::default();
        filters.add_region("Kanto");
        let request = SearchRequest::build("immunology", &filters, 20)
            .map_err(ErrorEnvelope::from)?;

        let response = api.search(&RequestContext::new_request(), request).await?;

        let ids: Vec<i64> = response.results.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(response.total_results, 1);
        Ok(())
    }

    #[tokio::test]
    async fn scripted_failures_expire() -> Result<()> {
        let api = FixedLabApi::new().with_catalog(vec!["Kanto".into()], Vec::new());
        api.fail(operation::REGIONS, ErrorEnvelope::network("down"), Some(1));
        let ctx = RequestContext::new_request();

        let first = api.regions(&ctx).await;
        let second = api.regions(&ctx).await?;

        assert_eq!(first.err().map(|error| error.kind), Some(ErrorKind::Network));
        assert_eq!(second, vec!["Kanto".to_string()]);
        assert_eq!(api.calls(operation::REGIONS), 2);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_lab_is_not_found() {
        let api = FixedLabApi::new();
        let error = api
            .lab_detail(&RequestContext::new_request(), 999)
            .await
            .err();
        assert_eq!(error.map(|error| error.kind), Some(ErrorKind::NotFound));
    }
}
