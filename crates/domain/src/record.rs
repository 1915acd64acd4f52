//! Canonical search-result record and the result normalizer.
//!
//! The backend and its historical clients emit several result shapes. The API
//! layer reconciles them into a [`RawSearchResult`] and [`normalize`] turns that
//! into a [`SearchResultRecord`] whose invariants always hold:
//!
//! - every display string is non-blank (a per-field placeholder fills gaps)
//! - `similarity_score` lies in `[0.0, 1.0]`
//!
//! A lone record without an id gets id `0`. Use [`normalize_results`] for a
//! result set: it gives each id-less record a distinct negative placeholder id
//! (backend ids are positive), so ids stay unique within the set.
//!
//! Score scale detection (`> 1` means percent) is a best-effort heuristic. A
//! service that reports `1.0` meaning "1 percent" is indistinguishable from a
//! perfect match; the contract needs upstream clarification.

use crate::lab::ExternalUrl;
use serde::Serialize;

/// Substitute score for absent or non-finite input.
pub const DEFAULT_SIMILARITY_SCORE: f64 = 0.5;

/// Display fields that fall back to a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    /// Lab name.
    Name,
    /// Head of the lab.
    ProfessorName,
    /// University display name.
    UniversityName,
    /// Prefecture.
    Prefecture,
    /// Region.
    Region,
    /// Research theme.
    ResearchTheme,
    /// Research content.
    ResearchContent,
    /// Research field.
    ResearchField,
}

impl RecordField {
    /// Placeholder shown when the field is absent or blank.
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Name => "Lab name not registered",
            Self::ProfessorName => "Professor name not registered",
            Self::UniversityName => "University not registered",
            Self::Prefecture => "Prefecture not registered",
            Self::Region => "Region not registered",
            Self::ResearchTheme => "Research theme not registered",
            Self::ResearchContent => "Research content not registered",
            Self::ResearchField => "Research field not registered",
        }
    }
}

/// A search result as received, before normalization.
///
/// Every field is optional; `similarity_score` is `None` when the payload
/// value was missing or not a JSON number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSearchResult {
    /// Backend identifier.
    pub id: Option<i64>,
    /// Lab name.
    pub name: Option<String>,
    /// Head of the lab.
    pub professor_name: Option<String>,
    /// University display name.
    pub university_name: Option<String>,
    /// Prefecture.
    pub prefecture: Option<String>,
    /// Region.
    pub region: Option<String>,
    /// Research theme.
    pub research_theme: Option<String>,
    /// Research content.
    pub research_content: Option<String>,
    /// Research field.
    pub research_field: Option<String>,
    /// Department.
    pub department: Option<String>,
    /// Speciality.
    pub speciality: Option<String>,
    /// Comma-separated keywords.
    pub keywords: Option<String>,
    /// Score as sent: fraction, percentage, or anything else.
    pub similarity_score: Option<f64>,
    /// Lab homepage, unvalidated.
    pub lab_url: Option<String>,
}

/// Canonical, normalized search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultRecord {
    /// Identifier, unique within a result set.
    pub id: i64,
    /// Lab name.
    pub name: String,
    /// Head of the lab.
    pub professor_name: String,
    /// University display name.
    pub university_name: String,
    /// Prefecture.
    pub prefecture: String,
    /// Region.
    pub region: String,
    /// Research theme.
    pub research_theme: String,
    /// Research content.
    pub research_content: String,
    /// Research field.
    pub research_field: String,
    /// Department, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Speciality, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    /// Comma-separated keywords, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Relevance in `[0.0, 1.0]`.
    pub similarity_score: f64,
    /// Validated external homepage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_url: Option<ExternalUrl>,
}

/// Clamp/rescale a raw score into `[0.0, 1.0]`.
///
/// Non-finite or absent values become [`DEFAULT_SIMILARITY_SCORE`]; values
/// above 1 are read as percentages; negatives clamp to 0.
#[must_use]
pub fn normalize_score(raw: Option<f64>) -> f64 {
    let Some(score) = raw.filter(|score| score.is_finite()) else {
        return DEFAULT_SIMILARITY_SCORE;
    };
    let scaled = if score > 1.0 { score / 100.0 } else { score };
    if scaled <= 0.0 {
        0.0
    } else {
        scaled.min(1.0)
    }
}

/// Normalize a raw record. Total: never fails.
#[must_use]
pub fn normalize(raw: RawSearchResult) -> SearchResultRecord {
    SearchResultRecord {
        id: raw.id.unwrap_or(0),
        name: text_or_placeholder(raw.name, RecordField::Name),
        professor_name: text_or_placeholder(raw.professor_name, RecordField::ProfessorName),
        university_name: text_or_placeholder(raw.university_name, RecordField::UniversityName),
        prefecture: text_or_placeholder(raw.prefecture, RecordField::Prefecture),
        region: text_or_placeholder(raw.region, RecordField::Region),
        research_theme: text_or_placeholder(raw.research_theme, RecordField::ResearchTheme),
        research_content: text_or_placeholder(raw.research_content, RecordField::ResearchContent),
        research_field: text_or_placeholder(raw.research_field, RecordField::ResearchField),
        department: non_blank(raw.department),
        speciality: non_blank(raw.speciality),
        keywords: non_blank(raw.keywords),
        similarity_score: normalize_score(raw.similarity_score),
        lab_url: raw.lab_url.as_deref().and_then(ExternalUrl::parse),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == value.len() {
            Some(value)
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn text_or_placeholder(value: Option<String>, field: RecordField) -> String {
    non_blank(value).unwrap_or_else(|| field.placeholder().to_string())
}

impl From<SearchResultRecord> for RawSearchResult {
    fn from(record: SearchResultRecord) -> Self {
        Self {
            id: Some(record.id),
            name: Some(record.name),
            professor_name: Some(record.professor_name),
            university_name: Some(record.university_name),
            prefecture: Some(record.prefecture),
            region: Some(record.region),
            research_theme: Some(record.research_theme),
            research_content: Some(record.research_content),
            research_field: Some(record.research_field),
            department: record.department,
            speciality: record.speciality,
            keywords: record.keywords,
            similarity_score: Some(record.similarity_score),
            lab_url: record.lab_url.map(|url| url.as_str().to_string()),
        }
    }
}

/// Normalize a whole result set, keeping ids unique.
///
/// Records without an id get `-1`, `-2`, ... in input order. Duplicate ids
/// sent by the backend are passed through unchanged.
#[must_use]
pub fn normalize_results(raws: impl IntoIterator<Item = RawSearchResult>) -> Vec<SearchResultRecord> {
    let mut next_placeholder: i64 = 0;
    raws.into_iter()
        .map(|mut raw| {
            if raw.id.is_none() {
                next_placeholder -= 1;
                raw.id = Some(next_placeholder);
            }
            normalize(raw)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn out_of_range_scores_are_rescaled_or_clamped() {
        assert!((normalize_score(Some(78.0)) - 0.78).abs() < f64::EPSILON);
        assert!((normalize_score(Some(150.0)) - 1.0).abs() < f64::EPSILON);
        assert!(normalize_score(Some(-5.0)).abs() < f64::EPSILON);
        assert!((normalize_score(Some(f64::NAN)) - DEFAULT_SIMILARITY_SCORE).abs() < f64::EPSILON);
        assert!(
            (normalize_score(Some(f64::INFINITY)) - DEFAULT_SIMILARITY_SCORE).abs() < f64::EPSILON
        );
        assert!((normalize_score(None) - DEFAULT_SIMILARITY_SCORE).abs() < f64::EPSILON);
        assert!((normalize_score(Some(0.9)) - 0.9).abs() < f64::EPSILON);
        assert!((normalize_score(Some(1.0)) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_and_blank_strings_get_placeholders() {
        let record = normalize(RawSearchResult {
            id: Some(3),
            name: Some("Tanaka Lab".to_string()),
            professor_name: Some("   ".to_string()),
            region: Some(String::new()),
            ..RawSearchResult::default()
        });

        assert_eq!(record.id, 3);
        assert_eq!(record.name, "Tanaka Lab");
        assert_eq!(record.professor_name, RecordField::ProfessorName.placeholder());
        assert_eq!(record.region, RecordField::Region.placeholder());
        assert_eq!(record.university_name, RecordField::UniversityName.placeholder());
        assert_eq!(record.department, None);
    }

    #[test]
    fn unsafe_lab_urls_are_dropped() {
        let record = normalize(RawSearchResult {
            lab_url: Some("javascript:alert(1)".to_string()),
            ..RawSearchResult::default()
        });
        assert_eq!(record.lab_url, None);
    }

    fn raw_strategy() -> impl Strategy<Value = RawSearchResult> {
        let text = proptest::option::of(prop_oneof![
            Just(String::new()),
            Just("  ".to_string()),
            "[a-zA-Z ]{1,12}",
            "[ぁ-ん]{1,6}",
        ]);
        let score = proptest::option::of(prop_oneof![
            -1_000.0f64..1_000.0,
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
            Just(-0.0),
        ]);
        let url = proptest::option::of(prop_oneof![
            Just("https://example.com/lab".to_string()),
            Just("ftp://example.com".to_string()),
            "[a-z]{0,8}",
        ]);
        (
            proptest::option::of(any::<i64>()),
            (
                text.clone(),
                text.clone(),
                text.clone(),
                text.clone(),
                text.clone(),
                text.clone(),
                text.clone(),
                text,
            ),
            score,
            url,
        )
            .prop_map(|(id, (a, b, c, d, e, f, g, h), similarity_score, lab_url)| {
                RawSearchResult {
                    id,
                    name: a,
                    professor_name: b,
                    university_name: c,
                    prefecture: d,
                    region: e,
                    research_theme: f,
                    research_content: g,
                    research_field: h.clone(),
                    department: h,
                    speciality: None,
                    keywords: None,
                    similarity_score,
                    lab_url,
                }
            })
    }

    proptest! {
        #[test]
        fn normalized_score_is_always_in_unit_interval(raw in raw_strategy()) {
            let record = normalize(raw);
            prop_assert!((0.0..=1.0).contains(&record.similarity_score));
        }

        #[test]
        fn normalize_is_idempotent(raw in raw_strategy()) {
            let once = normalize(raw);
            let twice = normalize(RawSearchResult::from(once.clone()));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn display_strings_are_never_blank(raw in raw_strategy()) {
            let record = normalize(raw);
            for value in [
                &record.name,
                &record.professor_name,
                &record.university_name,
                &record.prefecture,
                &record.region,
                &record.research_theme,
                &record.research_content,
                &record.research_field,
            ] {
                prop_assert!(!value.trim().is_empty());
            }
        }
    }

    #[test]
    fn id_less_records_get_distinct_placeholder_ids() {
        let raws = vec![
            RawSearchResult::default(),
            RawSearchResult {
                id: Some(12),
                ..RawSearchResult::default()
            },
            RawSearchResult::default(),
        ];

        let ids: Vec<i64> = normalize_results(raws).iter().map(|record| record.id).collect();

        assert_eq!(ids, vec![-1, 12, -2]);
    }
}
