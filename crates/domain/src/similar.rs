//! Similar-lab result sets and the degraded-mode fallback.

use crate::record::{RawSearchResult, SearchResultRecord, normalize};
use serde::Serialize;

/// Similar labs, tagged by where they came from.
///
/// `Degraded` holds placeholder labs served because the backend capability
/// was unavailable. Views must present them as such.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum SimilarLabs {
    /// Returned by the service.
    Live {
        /// Normalized records in rank order.
        labs: Vec<SearchResultRecord>,
    },
    /// Fixed placeholder set.
    Degraded {
        /// Placeholder records.
        labs: Vec<SearchResultRecord>,
        /// Why the live call was not used.
        reason: String,
    },
}

impl SimilarLabs {
    /// Records regardless of source.
    #[must_use]
    pub fn labs(&self) -> &[SearchResultRecord] {
        match self {
            Self::Live { labs } | Self::Degraded { labs, .. } => labs,
        }
    }

    /// True for the placeholder set.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

struct FallbackLab {
    offset: i64,
    suffix: char,
    theme: &'static str,
    content: &'static str,
    field: &'static str,
    prefecture: &'static str,
    region: &'static str,
    score: f64,
    url: Option<&'static str>,
}

const FALLBACK_LABS: [FallbackLab; 3] = [
    FallbackLab {
        offset: 1_000,
        suffix: 'A',
        theme: "Working on a closely related research theme",
        content: "Covers similar research content using current techniques.",
        field: "Immunology",
        prefecture: "Tokyo",
        region: "Kanto",
        score: 0.78,
        url: Some("https://example.com"),
    },
    FallbackLab {
        offset: 2_000,
        suffix: 'B',
        theme: "Studies the same field from another angle",
        content: "Takes a different approach to the same field, with international collaborations.",
        field: "Immunology",
        prefecture: "Kanagawa",
        region: "Kanto",
        score: 0.72,
        url: None,
    },
    FallbackLab {
        offset: 3_000,
        suffix: 'C',
        theme: "Research built on emerging techniques",
        content: "Applies advanced techniques and works closely with industry partners.",
        field: "Biology",
        prefecture: "Osaka",
        region: "Kansai",
        score: 0.68,
        url: None,
    },
];

/// Placeholder set served in degraded mode for `lab_id`.
///
/// Ids are offset from `lab_id` so they never collide with the lab itself.
/// Entries whose offset id would overflow are left out.
#[must_use]
pub fn fallback_similar_labs(lab_id: i64) -> Vec<SearchResultRecord> {
    FALLBACK_LABS
        .iter()
        .filter_map(|lab| Some((lab, lab_id.checked_add(lab.offset)?)))
        .map(|(lab, id)| {
            normalize(RawSearchResult {
                id: Some(id),
                name: Some(format!("Related Lab {}", lab.suffix)),
                professor_name: Some(format!("Related Professor {}", lab.suffix)),
                university_name: Some(format!("Related University {}", lab.suffix)),
                prefecture: Some(lab.prefecture.to_string()),
                region: Some(lab.region.to_string()),
                research_theme: Some(lab.theme.to_string()),
                research_content: Some(lab.content.to_string()),
                research_field: Some(lab.field.to_string()),
                department: Some(format!("Related Department {}", lab.suffix)),
                speciality: None,
                keywords: None,
                similarity_score: Some(lab.score),
                lab_url: lab.url.map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_ids_are_offset_from_the_lab() {
        let ids: Vec<i64> = fallback_similar_labs(7).iter().map(|lab| lab.id).collect();
        assert_eq!(ids, vec![1_007, 2_007, 3_007]);

        let near_max: Vec<i64> = fallback_similar_labs(i64::MAX - 2_500)
            .iter()
            .map(|lab| lab.id)
            .collect();
        assert_eq!(near_max, vec![i64::MAX - 1_500, i64::MAX - 500]);
        assert!(fallback_similar_labs(i64::MAX).is_empty());
    }

    #[test]
    fn fallback_scores_are_rank_descending() {
        let scores: Vec<f64> = fallback_similar_labs(1)
            .iter()
            .map(|lab| lab.similarity_score)
            .collect();
        assert_eq!(scores, vec![0.78, 0.72, 0.68]);
    }

    #[test]
    fn degraded_sets_are_tagged_when_serialized() -> Result<(), serde_json::Error> {
        let degraded = SimilarLabs::Degraded {
            labs: fallback_similar_labs(1),
            reason: "similar-labs endpoint returned 404".to_string(),
        };
        let value = serde_json::to_value(&degraded)?;

        assert!(degraded.is_degraded());
        assert_eq!(value["source"], "degraded");
        assert_eq!(degraded.labs().len(), 3);

        let live = SimilarLabs::Live { labs: Vec::new() };
        assert_eq!(serde_json::to_value(&live)?["source"], "live");
        Ok(())
    }
}
