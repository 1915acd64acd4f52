//! Search response model.

use crate::filters::{SearchFilterState, apply_local_filters};
use crate::record::SearchResultRecord;
use serde::Serialize;

/// Ranked results for one search, already normalized.
///
/// `results` keeps the service's rank order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Query the service answered.
    pub query: String,
    /// Total matches reported by the service.
    pub total_results: u64,
    /// Server-side search time in milliseconds, never negative.
    pub search_time_ms: f64,
    /// Normalized records in rank order.
    pub results: Vec<SearchResultRecord>,
}

impl SearchResponse {
    /// True when the service found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Header line for a result list, e.g. `2 results for "immunology" (12.5 ms)`.
    #[must_use]
    pub fn summary(&self) -> String {
        let noun = if self.total_results == 1 {
            "result"
        } else {
            "results"
        };
        format!(
            "{} {noun} for \"{}\" ({:.1} ms)",
            self.total_results, self.query, self.search_time_ms
        )
    }

    /// Copy of this response with the filters re-applied locally.
    ///
    /// `total_results` reflects the records that survived.
    #[must_use]
    pub fn filtered(&self, filters: &SearchFilterState) -> Self {
        let results = apply_local_filters(&self.results, filters);
        Self {
            query: self.query.clone(),
            total_results: results.len() as u64,
            search_time_ms: self.search_time_ms,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawSearchResult, normalize};

    fn response(scores: &[f64]) -> SearchResponse {
        let results: Vec<SearchResultRecord> = scores
            .iter()
            .zip(1..)
            .map(|(score, id)| {
                normalize(RawSearchResult {
                    id: Some(id),
                    similarity_score: Some(*score),
                    ..RawSearchResult::default()
                })
            })
            .collect();
        SearchResponse {
            query: "immunology".to_string(),
            total_results: results.len() as u64,
            search_time_ms: 12.46,
            results,
        }
    }

    #[test]
    fn summary_pluralizes_and_formats_time() {
        assert_eq!(
            response(&[0.9, 0.78]).summary(),
            "2 results for \"immunology\" (12.5 ms)"
        );
        assert_eq!(
            response(&[0.9]).summary(),
            "1 result for \"immunology\" (12.5 ms)"
        );
    }

    #[test]
    fn filtered_keeps_rank_order() -> Result<(), crate::FilterError> {
        let mut filters = SearchFilterState::default();
        filters.set_min_similarity(0.7)?;

        let filtered = response(&[0.9, 0.5, 0.78]).filtered(&filters);

        let ids: Vec<i64> = filtered.results.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(filtered.total_results, 2);
        Ok(())
    }
}
