//! Lenient decoding of search-result payloads.
//!
//! The backend and older clients disagree on result shapes:
//!
//! - snake_case flat records (`similarity_score`, `professor_name`, `university_name`)
//! - camelCase flat records (`similarityScore`, `professorName`, `universityName`)
//! - `score` instead of `similarity_score`
//! - lab records with a nested `university` object and no score at all
//!
//! Every shape is folded into a `RawSearchResult` and normalized. Nothing in
//! this module fails on a malformed record.

use lab_finder_domain::{RawSearchResult, SearchResponse, SearchResultRecord, normalize_results};
use serde_json::{Map, Value};

/// Fold any known result shape into a raw record.
///
/// Non-object values produce an empty raw record, which normalizes to
/// placeholders.
#[must_use]
pub fn raw_result_from_value(value: &Value) -> RawSearchResult {
    let Some(object) = value.as_object() else {
        return RawSearchResult::default();
    };
    let university = object.get("university").and_then(Value::as_object);
    let from_university = |key: &str| university.and_then(|nested| text(nested, &[key]));

    RawSearchResult {
        id: integer(object, &["id", "lab_id", "labId"]),
        name: text(object, &["name", "lab_name", "labName"]),
        professor_name: text(object, &["professor_name", "professorName"]),
        university_name: text(object, &["university_name", "universityName"])
            .or_else(|| from_university("name"))
            .or_else(|| text(object, &["university"])),
        prefecture: text(object, &["prefecture"]).or_else(|| from_university("prefecture")),
        region: text(object, &["region"]).or_else(|| from_university("region")),
        research_theme: text(object, &["research_theme", "researchTheme"]),
        research_content: text(object, &["research_content", "researchContent"]),
        research_field: text(object, &["research_field", "researchField"]),
        department: text(object, &["department"]),
        speciality: text(object, &["speciality", "specialty"]),
        keywords: keywords(object),
        similarity_score: number(object, &["similarity_score", "similarityScore", "score"]),
        lab_url: text(object, &["lab_url", "labUrl", "url"]),
    }
}

/// Decode a 2xx search body into a normalized response.
///
/// Missing `query` falls back to the requested query; missing
/// `total_results` falls back to the number of results; a missing, negative,
/// or non-finite `search_time_ms` becomes 0.
#[must_use]
pub fn search_response_from_value(value: &Value, requested_query: &str) -> SearchResponse {
    let object = value.as_object();
    let results = normalize_results(result_items(value).iter().map(raw_result_from_value));

    let query = object
        .and_then(|object| text(object, &["query"]))
        .unwrap_or_else(|| requested_query.to_string());
    let total_results = object
        .and_then(|object| count(object, &["total_results", "totalResults", "total"]))
        .unwrap_or(results.len() as u64);
    let search_time_ms = object
        .and_then(|object| number(object, &["search_time_ms", "searchTimeMs"]))
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
        .unwrap_or(0.0);

    SearchResponse {
        query,
        total_results,
        search_time_ms,
        results,
    }
}

/// Decode a 2xx similar-labs body (an array, or an object with `results`).
#[must_use]
pub fn similar_labs_from_value(value: &Value) -> Vec<SearchResultRecord> {
    normalize_results(result_items(value).iter().map(raw_result_from_value))
}

fn result_items(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        Value::Object(object) => ["results", "labs", "similar_labs"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    }
}

fn first<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first(object, keys)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn number(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    first(object, keys).and_then(Value::as_f64)
}

fn integer(object: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    match first(object, keys)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn count(object: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    first(object, keys).and_then(Value::as_u64)
}

fn keywords(object: &Map<String, Value>) -> Option<String> {
    match first(object, &["keywords"])? {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let words: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!words.is_empty()).then(|| words.join(", "))
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_finder_domain::{DEFAULT_SIMILARITY_SCORE, RecordField, normalize};
    use serde_json::json;

    #[test]
    fn snake_and_camel_shapes_reconcile_to_the_same_record() {
        let snake = json!({
            "id": 1, "name": "Suzuki Lab", "professor_name": "Suzuki",
            "university_name": "Osaka University", "prefecture": "Osaka", "region": "Kansai",
            "research_theme": "T cells", "research_content": "Adaptive immunity",
            "research_field": "Immunology", "similarity_score": 0.9,
            "lab_url": "https://example.com/suzuki"
        });
        let camel = json!({
            "id": 1, "name": "Suzuki Lab", "professorName": "Suzuki",
            "universityName": "Osaka University", "prefecture": "Osaka", "region": "Kansai",
            "researchTheme": "T cells", "researchContent": "Adaptive immunity",
            "researchField": "Immunology", "similarityScore": 0.9,
            "labUrl": "https://example.com/suzuki"
        });

        assert_eq!(
            normalize(raw_result_from_value(&snake)),
            normalize(raw_result_from_value(&camel))
        );
    }

    #[test]
    fn nested_university_shape_fills_location_fields() {
        let lab = json!({
            "id": 12, "name": "Sato Lab", "research_field": "Virology",
            "university": {"id": 3, "name": "Tohoku University", "type": "national",
                           "prefecture": "Miyagi", "region": "Tohoku"}
        });

        let record = normalize(raw_result_from_value(&lab));

        assert_eq!(record.university_name, "Tohoku University");
        assert_eq!(record.prefecture, "Miyagi");
        assert_eq!(record.region, "Tohoku");
        assert!((record.similarity_score - DEFAULT_SIMILARITY_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_fields_are_absorbed() {
        let record = normalize(raw_result_from_value(&json!({
            "id": "42", "name": 7, "score": "high", "keywords": ["T cell", "cytokine"]
        })));

        assert_eq!(record.id, 42);
        assert_eq!(record.name, RecordField::Name.placeholder());
        assert!((record.similarity_score - DEFAULT_SIMILARITY_SCORE).abs() < f64::EPSILON);
        assert_eq!(record.keywords.as_deref(), Some("T cell, cytokine"));
    }

    #[test]
    fn score_alias_is_accepted() {
        let record = normalize(raw_result_from_value(&json!({"id": 2, "score": 78})));
        assert!((record.similarity_score - 0.78).abs() < 1e-9);
    }

    #[test]
    fn response_defaults_come_from_results_and_request() {
        let body = json!({
            "results": [{"id": 1, "similarity_score": 0.9}, {"id": 2, "similarity_score": 78}],
            "search_time_ms": -3.0
        });

        let response = search_response_from_value(&body, "immunology");

        assert_eq!(response.query, "immunology");
        assert_eq!(response.total_results, 2);
        assert!(response.search_time_ms.abs() < f64::EPSILON);
        let ids: Vec<i64> = response.results.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn similar_labs_accept_array_and_wrapped_bodies() {
        let array = json!([{"id": 5}, {"id": 6}]);
        let wrapped = json!({"results": [{"id": 5}, {"id": 6}]});
        assert_eq!(similar_labs_from_value(&array), similar_labs_from_value(&wrapped));
        assert!(similar_labs_from_value(&json!("nope")).is_empty());
    }

    #[test]
    fn id_less_results_keep_unique_ids() {
        let body = json!({
            "results": [
                {"name": "Lab A", "similarity_score": 0.9},
                {"name": "Lab B", "similarity_score": 0.8},
            ]
        });

        let response = search_response_from_value(&body, "immunology");

        let ids: Vec<i64> = response.results.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![-1, -2]);
    }
}
