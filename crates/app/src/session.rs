//! Search view model.
//!
//! A [`SearchSession`] owns the filter state and the displayed response of
//! one search view. Every search is tagged with a generation number; only the
//! latest-initiated search may write the view state, and a response for an
//! older generation is reported as [`SearchOutcome::Stale`] and dropped.
//! [`SearchSession::close`] cancels in-flight requests and freezes the state.

use crate::deps::{LabFinderDeps, fields};
use crate::search_labs::{SearchLabsInput, search_labs};
use lab_finder_domain::{SearchFilterState, SearchResponse, SearchResultRecord, SortMode, order};
use lab_finder_shared::{
    CancellationToken, CorrelationId, ErrorCode, ErrorEnvelope, RequestContext, Result,
};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Snapshot of what the search view displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchViewState {
    /// Query of the latest search, trimmed.
    pub query: Option<String>,
    /// True while the latest search is in flight.
    pub loading: bool,
    /// Latest successful response.
    pub response: Option<SearchResponse>,
    /// Latest failure; cleared when a new search starts.
    pub error: Option<ErrorEnvelope>,
}

impl SearchViewState {
    /// Whether the view should offer a retry for the current error.
    pub fn can_retry(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(ErrorEnvelope::is_retry_offered)
    }
}

/// What happened to one search call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The response is now displayed.
    Displayed(SearchResponse),
    /// A newer search was started first; this response was discarded.
    Stale,
}

/// View-scoped search state with latest-wins semantics.
pub struct SearchSession {
    deps: LabFinderDeps,
    limit: u32,
    generation: AtomicU64,
    view: CancellationToken,
    filters: Mutex<SearchFilterState>,
    state: Mutex<SearchViewState>,
    last_input: Mutex<Option<SearchLabsInput>>,
}

impl SearchSession {
    /// New session issuing searches with `limit` results.
    #[must_use]
    pub fn new(deps: LabFinderDeps, limit: u32) -> Self {
        Self::with_filters(deps, limit, SearchFilterState::default())
    }

    /// New session starting from `filters`.
    #[must_use]
    pub fn with_filters(deps: LabFinderDeps, limit: u32, filters: SearchFilterState) -> Self {
        Self {
            deps,
            limit,
            generation: AtomicU64::new(0),
            view: CancellationToken::new(),
            filters: Mutex::new(filters),
            state: Mutex::new(SearchViewState::default()),
            last_input: Mutex::new(None),
        }
    }

    /// Current view state.
    pub fn state(&self) -> SearchViewState {
        lock(&self.state).clone()
    }

    /// Current filters.
    pub fn filters(&self) -> SearchFilterState {
        lock(&self.filters).clone()
    }

    /// Mutate the filters in place. Takes effect on the next search.
    pub fn update_filters<R>(&self, update: impl FnOnce(&mut SearchFilterState) -> R) -> R {
        update(&mut lock(&self.filters))
    }

    /// The "reset filters" action of the no-results screen.
    pub fn relax_filters(&self) {
        self.update_filters(SearchFilterState::relax);
    }

    /// Displayed results re-filtered locally and ordered for rendering.
    pub fn displayed_results(&self, mode: SortMode) -> Vec<SearchResultRecord> {
        let filters = self.filters();
        let state = lock(&self.state);
        state
            .response
            .as_ref()
            .map(|response| order(response.filtered(&filters).results, mode))
            .unwrap_or_default()
    }

    /// True once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.view.is_cancelled()
    }

    /// Search for `query` with the current filters.
    ///
    /// Invalid input fails with `Validation` and leaves the view untouched.
    /// Backend failures are recorded in the view state and returned.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome> {
        let input = SearchLabsInput {
            query: query.into(),
            filters: self.filters(),
            limit: self.limit,
        };
        self.issue(input).await
    }

    /// Re-issue the latest search exactly as it was sent. Filter changes made
    /// since then apply to the next [`search`](Self::search) only.
    pub async fn retry(&self) -> Result<SearchOutcome> {
        let input = lock(&self.last_input).clone();
        let Some(input) = input else {
            return Err(ErrorEnvelope::validation(
                ErrorCode::new("search", "nothing_to_retry"),
                "no search has been issued yet",
            ));
        };
        self.issue(input).await
    }

    async fn issue(&self, input: SearchLabsInput) -> Result<SearchOutcome> {
        self.ensure_open()?;
        let request = input.to_request().map_err(ErrorEnvelope::from)?;

        let generation = {
            let mut state = lock(&self.state);
            let generation = self.generation.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
            *lock(&self.last_input) = Some(input.clone());
            state.query = Some(request.query().to_string());
            state.loading = true;
            state.error = None;
            generation
        };

        let ctx = RequestContext::with_cancellation(
            CorrelationId::new_request_id(),
            self.view.clone(),
        );
        let result = search_labs(&ctx, &self.deps, input).await;

        let mut state = lock(&self.state);
        self.ensure_open()?;
        let latest = self.generation.load(Ordering::SeqCst);
        if latest != generation {
            drop(state);
            self.deps.count("app.search.stale", None);
            self.deps.info(
                "app.search.stale",
                "Discarded response superseded by a newer search",
                fields([
                    ("correlationId", Value::from(ctx.correlation_id().as_str())),
                    ("generation", Value::from(generation)),
                    ("latestGeneration", Value::from(latest)),
                ]),
            );
            return Ok(SearchOutcome::Stale);
        }

        state.loading = false;
        match result {
            Ok(response) => {
                state.response = Some(response.clone());
                Ok(SearchOutcome::Displayed(response))
            },
            Err(error) => {
                state.error = Some(error.clone());
                Err(error)
            },
        }
    }

    /// Leave the view: cancel in-flight searches and stop accepting results.
    pub fn close(&self) {
        self.view.cancel();
        lock(&self.state).loading = false;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ErrorEnvelope::cancelled("search view closed")
                .with_metadata("operation", "app.search_session"));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_finder_adapters::FixedLabApi;
    use lab_finder_domain::{RawSearchResult, normalize};
    use lab_finder_shared::ErrorKind;
    use std::sync::Arc;

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

    fn session() -> SearchSession {
        let api = FixedLabApi::new().with_results(vec![
            record(1, "Zeta Immunology Lab", "Kanto", 0.9),
            record(2, "Alpha Immunology Lab", "Kansai", 0.8),
        ]);
        SearchSession::new(LabFinderDeps::new(Arc::new(api)), 20)
    }

    #[tokio::test]
    async fn blank_query_leaves_the_view_untouched() {
        let session = session();
        let error = session.search("   ").await.err();

        assert_eq!(error.map(|error| error.kind), Some(ErrorKind::Validation));
        assert_eq!(session.state(), SearchViewState::default());
    }

    #[tokio::test]
    async fn displayed_results_apply_local_filters_and_order() -> Result<()> {
        let session = session();
        session.search("immunology").await?;

        let by_name: Vec<i64> = session
            .displayed_results(SortMode::Name)
            .iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(by_name, vec![2, 1]);

        session.update_filters(|filters| filters.add_region("Kanto"));
        let kanto: Vec<i64> = session
            .displayed_results(SortMode::Relevance)
            .iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(kanto, vec![1]);
        Ok(())
    }

    #[tokio::test]
    async fn retry_without_a_previous_search_is_rejected() {
        let error = session().retry().await.err();
        assert_eq!(
            error.map(|error| error.code.to_string()),
            Some("search:nothing_to_retry".to_string())
        );
    }

    #[tokio::test]
    async fn closed_session_rejects_new_searches() {
        let session = session();
        session.close();

        let error = session.search("immunology").await.err();

        assert!(session.is_closed());
        assert_eq!(error.map(|error| error.kind), Some(ErrorKind::Cancelled));
        assert!(!session.state().loading);
    }
}
