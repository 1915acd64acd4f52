//! Lab Finder backend boundary contract.
//!
//! Implementations must return normalized records only, and map failures
//! into the shared taxonomy: `Network` when no response arrived, `Service`
//! for non-2xx, `NotFound` for 404 on a resource lookup.

use crate::BoxFuture;
use lab_finder_domain::{
    HealthStatus, ResearchLab, SearchRequest, SearchResponse, SearchResultRecord, Suggestion,
};
use lab_finder_shared::{RequestContext, Result};

/// Request for labs similar to a given lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarLabsRequest {
    /// Lab to compare against.
    pub lab_id: i64,
    /// Maximum number of labs.
    pub limit: u32,
}

/// Request for query completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionsRequest {
    /// Partial query text.
    pub query: Box<str>,
    /// Maximum number of suggestions.
    pub limit: u32,
}

/// Boundary contract for the ranked-search service.
pub trait LabApiPort: Send + Sync {
    /// Run a ranked search. Each call issues exactly one request.
    fn search(
        &self,
        ctx: &RequestContext,
        request: SearchRequest,
    ) -> BoxFuture<'_, Result<SearchResponse>>;

    /// Fetch one lab. Fails with `NotFound` on 404.
    fn lab_detail(&self, ctx: &RequestContext, lab_id: i64) -> BoxFuture<'_, Result<ResearchLab>>;

    /// Labs similar to `request.lab_id`, in rank order.
    ///
    /// Never substitutes placeholder data; degraded-mode policy belongs to
    /// the caller.
    fn similar_labs(
        &self,
        ctx: &RequestContext,
        request: SimilarLabsRequest,
    ) -> BoxFuture<'_, Result<Vec<SearchResultRecord>>>;

    /// Query completions.
    fn suggestions(
        &self,
        ctx: &RequestContext,
        request: SuggestionsRequest,
    ) -> BoxFuture<'_, Result<Vec<Suggestion>>>;

    /// Most frequent queries.
    fn popular_searches(
        &self,
        ctx: &RequestContext,
        limit: u32,
    ) -> BoxFuture<'_, Result<Vec<String>>>;

    /// Regions available as filters.
    fn regions(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<String>>>;

    /// Research fields available as filters.
    fn research_fields(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<String>>>;

    /// Service health.
    fn health(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<HealthStatus>>;
}
