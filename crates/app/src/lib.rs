//! # lab-finder-app
//!
//! Application use cases for the Lab Finder client: ranked search, lab
//! detail, similar labs with a degraded-mode policy, catalog lookups, and the
//! latest-wins [`SearchSession`].
//! This crate depends on `ports`, `domain`, `config`, and `shared`.

pub mod catalog;
pub mod deps;
pub mod lab_detail;
pub mod search_labs;
pub mod session;
pub mod similar_labs;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use catalog::{
    FilterOptions, MIN_SUGGESTION_CHARS, filter_options, health, popular_searches, suggestions,
};
pub use deps::LabFinderDeps;
pub use lab_detail::lab_detail;
pub use search_labs::{SearchLabsInput, search_labs};
pub use session::{SearchOutcome, SearchSession, SearchViewState};
pub use similar_labs::{MAX_SIMILAR_LIMIT, SimilarLabsInput, similar_labs};
