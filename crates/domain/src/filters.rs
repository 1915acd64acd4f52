//! Filter state owned by the active search view.

use crate::record::SearchResultRecord;
use lab_finder_shared::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

/// Minimum similarity applied on a fresh view and after `clear()`.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.5;
/// Threshold the "relax filters" action lowers to.
pub const RELAXED_MIN_SIMILARITY: f64 = 0.3;

const THRESHOLD_EPSILON: f64 = 1e-9;

/// Rejected filter mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// Threshold outside `[0.0, 1.0]` or not a number.
    #[error("minimum similarity must be between 0 and 1, got {value}")]
    MinSimilarityOutOfRange {
        /// Rejected value.
        value: f64,
    },
}

impl From<FilterError> for ErrorEnvelope {
    fn from(error: FilterError) -> Self {
        let FilterError::MinSimilarityOutOfRange { value } = error;
        Self::validation(
            ErrorCode::new("filter", "min_similarity_out_of_range"),
            error.to_string(),
        )
        .with_metadata("value", value.to_string())
    }
}

/// Active region/field filters and similarity threshold.
///
/// `has_active_filters` is recomputed on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilterState {
    regions: BTreeSet<String>,
    fields: BTreeSet<String>,
    min_similarity: f64,
    has_active_filters: bool,
}

impl Default for SearchFilterState {
    fn default() -> Self {
        Self {
            regions: BTreeSet::new(),
            fields: BTreeSet::new(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
            has_active_filters: false,
        }
    }
}

impl SearchFilterState {
    /// Selected regions, in sorted order.
    #[must_use]
    pub const fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    /// Selected research fields, in sorted order.
    #[must_use]
    pub const fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    /// Current similarity threshold.
    #[must_use]
    pub const fn min_similarity(&self) -> f64 {
        self.min_similarity
    }

    /// True when anything differs from the defaults.
    #[must_use]
    pub const fn has_active_filters(&self) -> bool {
        self.has_active_filters
    }

    /// Select a region. Blank names are ignored; returns whether the set changed.
    pub fn add_region(&mut self, region: impl Into<String>) -> bool {
        let changed = insert_trimmed(&mut self.regions, region.into());
        self.recompute();
        changed
    }

    /// Deselect a region; returns whether it was selected.
    pub fn remove_region(&mut self, region: &str) -> bool {
        let changed = self.regions.remove(region.trim());
        self.recompute();
        changed
    }

    /// Select a research field. Blank names are ignored; returns whether the set changed.
    pub fn add_field(&mut self, field: impl Into<String>) -> bool {
        let changed = insert_trimmed(&mut self.fields, field.into());
        self.recompute();
        changed
    }

    /// Deselect a research field; returns whether it was selected.
    pub fn remove_field(&mut self, field: &str) -> bool {
        let changed = self.fields.remove(field.trim());
        self.recompute();
        changed
    }

    /// Set the similarity threshold. The state is unchanged on error.
    pub fn set_min_similarity(&mut self, value: f64) -> Result<(), FilterError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(FilterError::MinSimilarityOutOfRange { value });
        }
        self.min_similarity = value;
        self.recompute();
        Ok(())
    }

    /// Reset to the defaults.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Drop region/field selections and lower the threshold to
    /// [`RELAXED_MIN_SIMILARITY`] when it is above it.
    pub fn relax(&mut self) {
        self.regions.clear();
        self.fields.clear();
        self.min_similarity = self.min_similarity.min(RELAXED_MIN_SIMILARITY);
        self.recompute();
    }

    /// Whether an already-fetched record passes the active filters.
    #[must_use]
    pub fn matches(&self, record: &SearchResultRecord) -> bool {
        let region_ok = self.regions.is_empty() || self.regions.contains(&record.region);
        let field_ok = self.fields.is_empty() || self.fields.contains(&record.research_field);
        region_ok && field_ok && record.similarity_score >= self.min_similarity
    }

    fn recompute(&mut self) {
        self.has_active_filters = !self.regions.is_empty()
            || !self.fields.is_empty()
            || (self.min_similarity - DEFAULT_MIN_SIMILARITY).abs() > THRESHOLD_EPSILON;
    }
}

fn insert_trimmed(set: &mut BTreeSet<String>, value: String) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    set.insert(trimmed.to_string())
}

/// Re-filter fetched results locally, preserving order.
#[must_use]
pub fn apply_local_filters(
    results: &[SearchResultRecord],
    filters: &SearchFilterState,
) -> Vec<SearchResultRecord> {
    results
        .iter()
        .filter(|record| filters.matches(record))
        .cloned()
        .collect()
}
