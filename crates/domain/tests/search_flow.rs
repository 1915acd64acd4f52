//! Integration coverage for the request → normalize → present flow.

use lab_finder_domain::{
    MatchTier, RawSearchResult, RecordField, RequestValidationError, SearchFilterState,
    SearchRequest, SearchResponse, SortMode, match_tier, normalize, order,
};
use lab_finder_shared::{ErrorEnvelope, ErrorKind};
use std::error::Error;

#[test]
fn blank_query_never_becomes_a_request() {
    let mut filters = SearchFilterState::default();
    filters.add_region("Kanto");

    let Err(error) = SearchRequest::build("   ", &filters, 10) else {
        unreachable!("blank queries must be rejected");
    };
    assert_eq!(error, RequestValidationError::BlankQuery);

    let envelope: ErrorEnvelope = error.into();
    assert_eq!(envelope.kind, ErrorKind::Validation);
    assert_eq!(envelope.code.namespace(), "search");
    assert_eq!(envelope.code.code(), "blank_query");
}

#[test]
fn percentage_scores_are_rescaled_and_rank_order_survives() -> Result<(), Box<dyn Error>> {
    let request = SearchRequest::build("immunology", &SearchFilterState::default(), 20)?;
    let raw = vec![
        RawSearchResult {
            id: Some(1),
            name: Some("Suzuki Lab".to_string()),
            similarity_score: Some(0.9),
            ..RawSearchResult::default()
        },
        RawSearchResult {
            id: Some(2),
            name: Some("Abe Lab".to_string()),
            similarity_score: Some(78.0),
            ..RawSearchResult::default()
        },
    ];

    let response = SearchResponse {
        query: request.query().to_string(),
        total_results: 2,
        search_time_ms: 3.0,
        results: raw.into_iter().map(normalize).collect(),
    };

    let second = response.results.get(1).ok_or("missing second result")?;
    assert!((second.similarity_score - 0.78).abs() < 1e-9);
    assert_eq!(second.professor_name, RecordField::ProfessorName.placeholder());

    let by_relevance = order(response.results.clone(), SortMode::Relevance);
    let ids: Vec<i64> = by_relevance.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![1, 2]);

    let by_name = order(response.results, SortMode::Name);
    let ids: Vec<i64> = by_name.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let tiers: Vec<MatchTier> = by_relevance
        .iter()
        .map(|record| match_tier(record.similarity_score))
        .collect();
    assert_eq!(tiers, vec![MatchTier::High, MatchTier::Medium]);
    Ok(())
}
