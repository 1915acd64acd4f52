//! # lab-finder-domain
//!
//! Pure domain model for the Lab Finder search client:
//!
//! - **Records** - `SearchResultRecord`, `RawSearchResult`, and the result normalizer
//! - **Labs** - `ResearchLab`, `University`, `ExternalUrl`
//! - **Requests** - `SearchRequest` and its builder
//! - **Filters** - `SearchFilterState` and local re-filtering
//! - **Presentation** - ordering, match tiers, response summaries
//! - **Similar labs** - live vs degraded result sets
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No I/O; every function here is synchronous and side-effect free

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use lab_finder_shared::shared_crate_version;

pub mod catalog;
pub mod filters;
pub mod lab;
pub mod presenter;
pub mod record;
pub mod request;
pub mod response;
pub mod similar;

pub use catalog::{HealthStatus, Suggestion};
pub use filters::{
    DEFAULT_MIN_SIMILARITY, FilterError, RELAXED_MIN_SIMILARITY, SearchFilterState,
    apply_local_filters,
};
pub use lab::{ExternalUrl, ResearchLab, University};
pub use presenter::{MatchTier, SortMode, match_percent, match_tier, order};
pub use record::{
    DEFAULT_SIMILARITY_SCORE, RawSearchResult, RecordField, SearchResultRecord, normalize,
    normalize_results, normalize_score,
};
pub use request::{
    DEFAULT_LIMIT, MAX_LIMIT, MAX_QUERY_CHARS, RequestValidationError, SearchRequest,
};
pub use response::SearchResponse;
pub use similar::{SimilarLabs, fallback_similar_labs};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
