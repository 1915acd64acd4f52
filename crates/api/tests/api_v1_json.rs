//! API v1 wire-format coverage against backend-shaped payloads.

use lab_finder_api::v1::{
    ApiV1ErrorKind, ApiV1HealthDto, ApiV1SuggestionDto, error_envelope_to_api_v1_error,
    error_message_from_body, health_from_api_v1, search_response_from_value,
    suggestion_from_api_v1,
};
use lab_finder_shared::ErrorEnvelope;
use serde_json::json;
use std::error::Error;

#[test]
fn backend_search_response_normalizes_percent_scores_in_order() -> Result<(), Box<dyn Error>> {
    let body = json!({
        "query": "immunology",
        "total_results": 2,
        "search_time_ms": 41.7,
        "results": [
            {"id": 1, "name": "Suzuki Lab", "similarity_score": 0.9,
             "university_name": "Osaka University", "prefecture": "Osaka", "region": "Kansai"},
            {"id": 2, "name": "Abe Lab", "similarity_score": 78,
             "university_name": "Keio University", "prefecture": "Tokyo", "region": "Kanto"}
        ]
    });

    let response = search_response_from_value(&body, "immunology");

    assert_eq!(response.total_results, 2);
    let scores: Vec<f64> = response
        .results
        .iter()
        .map(|record| record.similarity_score)
        .collect();
    let second = scores.get(1).copied().ok_or("missing second score")?;
    assert!((second - 0.78).abs() < 1e-9);
    let ids: Vec<i64> = response.results.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![1, 2]);
    Ok(())
}

#[test]
fn catalog_and_health_payloads_decode() -> Result<(), Box<dyn Error>> {
    let suggestions: Vec<ApiV1SuggestionDto> = serde_json::from_value(json!([
        {"text": "immunology", "category": "research_field"},
        {"text": "T cell"}
    ]))?;
    let suggestions: Vec<_> = suggestions.into_iter().map(suggestion_from_api_v1).collect();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions.get(1).map(|s| s.category.as_str()), Some(""));

    let health: ApiV1HealthDto = serde_json::from_value(json!({
        "status": "healthy", "message": "Lab Finder API is running", "version": "1.0.0"
    }))?;
    assert!(health_from_api_v1(health).is_healthy());
    Ok(())
}

#[test]
fn service_errors_render_with_backend_detail() -> Result<(), Box<dyn Error>> {
    let message = error_message_from_body(br#"{"detail": "Internal server error"}"#)
        .ok_or("detail should parse")?;
    let envelope = ErrorEnvelope::service(500, message);

    let dto = error_envelope_to_api_v1_error(&envelope);
    let value = serde_json::to_value(&dto)?;

    assert_eq!(dto.kind, ApiV1ErrorKind::Service);
    assert_eq!(
        value,
        json!({
            "code": "ERR_HTTP_SERVICE",
            "message": "Internal server error",
            "kind": "SERVICE",
            "status": 500,
            "retriable": true
        })
    );
    Ok(())
}
