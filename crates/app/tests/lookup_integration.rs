//! Lab detail and catalog lookups.

use lab_finder_adapters::lab_api::fixed::operation;
use lab_finder_adapters::{FixedLabApi, MemoryTelemetry};
use lab_finder_app::{
    LabFinderDeps, filter_options, health, lab_detail, popular_searches, suggestions,
};
use lab_finder_domain::{ExternalUrl, ResearchLab, Suggestion, University};
use lab_finder_shared::{ErrorEnvelope, ErrorKind, RequestContext, Result, RetryPolicy};
use std::sync::Arc;

fn lab(id: i64) -> ResearchLab {
    ResearchLab {
        id,
        name: "Innate Immunity Lab".to_string(),
        professor_name: Some("Sato Hanako".to_string()),
        department: None,
        research_theme: "Toll-like receptor signalling".to_string(),
        research_content: "Pattern recognition in innate immunity".to_string(),
        research_field: "Immunology".to_string(),
        speciality: None,
        keywords: Some("TLR, innate immunity".to_string()),
        lab_url: ExternalUrl::parse("https://example.com/innate"),
        university: University {
            id: 3,
            name: "Tohoku University".to_string(),
            university_type: "national".to_string(),
            prefecture: "Miyagi".to_string(),
            region: "Tohoku".to_string(),
        },
        created_at: None,
        updated_at: None,
    }
}

fn suggestion(text: &str, category: &str) -> Suggestion {
    Suggestion {
        text: text.to_string(),
        category: category.to_string(),
    }
}

fn deps(api: Arc<FixedLabApi>, telemetry: &MemoryTelemetry) -> LabFinderDeps {
    LabFinderDeps::new(api)
        .with_telemetry(Arc::new(telemetry.clone()))
        .with_retry(RetryPolicy::single_attempt())
}

#[tokio::test]
async fn lab_detail_returns_the_lab() -> Result<()> {
    let telemetry = MemoryTelemetry::default();
    let deps = deps(Arc::new(FixedLabApi::new().with_lab(lab(7))), &telemetry);

    let found = lab_detail(&RequestContext::new_request(), &deps, 7).await?;

    assert_eq!(found.university.name, "Tohoku University");
    assert_eq!(found.keyword_list(), vec!["TLR", "innate immunity"]);
    Ok(())
}

#[tokio::test]
async fn unknown_lab_is_not_found() {
    let telemetry = MemoryTelemetry::default();
    let deps = deps(Arc::new(FixedLabApi::new().with_lab(lab(7))), &telemetry);

    let error = lab_detail(&RequestContext::new_request(), &deps, 999)
        .await
        .err();

    assert_eq!(error.map(|error| error.kind), Some(ErrorKind::NotFound));
    assert_eq!(telemetry.counter("app.lab_detail.failed"), 1);
}

#[tokio::test]
async fn non_positive_lab_id_is_rejected_locally() {
    let telemetry = MemoryTelemetry::default();
    let api = Arc::new(FixedLabApi::new());
    let deps = deps(api.clone(), &telemetry);

    let error = lab_detail(&RequestContext::new_request(), &deps, 0)
        .await
        .err();

    assert_eq!(error.map(|error| error.kind), Some(ErrorKind::Validation));
    assert_eq!(api.calls(operation::LAB_DETAIL), 0);
}

#[tokio::test]
async fn short_prefixes_get_no_suggestions_and_no_request() -> Result<()> {
    let telemetry = MemoryTelemetry::default();
    let api = Arc::new(FixedLabApi::new().with_suggestions(vec![
        suggestion("immunology", "research_field"),
        suggestion("immunotherapy", "keyword"),
        suggestion("neuroscience", "research_field"),
    ]));
    let deps = deps(api.clone(), &telemetry);
    let ctx = RequestContext::new_request();

    let short = suggestions(&ctx, &deps, " im ", 5).await?;
    let matched = suggestions(&ctx, &deps, "immu", 5).await?;

    assert!(short.is_empty());
    let texts: Vec<&str> = matched.iter().map(|item| item.text.as_str()).collect();
    assert_eq!(texts, vec!["immunology", "immunotherapy"]);
    assert_eq!(api.calls(operation::SUGGESTIONS), 1);
    Ok(())
}

#[tokio::test]
async fn popular_searches_and_filter_options() -> Result<()> {
    let telemetry = MemoryTelemetry::default();
    let api = Arc::new(
        FixedLabApi::new()
            .with_popular(vec![
                "cancer".to_string(),
                "immunology".to_string(),
                "genomics".to_string(),
            ])
            .with_catalog(
                vec!["Kanto".to_string(), "Kansai".to_string()],
                vec!["Immunology".to_string()],
            ),
    );
    let deps = deps(api, &telemetry);
    let ctx = RequestContext::new_request();

    let popular = popular_searches(&ctx, &deps, 2).await?;
    let options = filter_options(&ctx, &deps).await?;

    assert_eq!(popular, vec!["cancer", "immunology"]);
    assert_eq!(options.regions, vec!["Kanto", "Kansai"]);
    assert_eq!(options.research_fields, vec!["Immunology"]);
    Ok(())
}

#[tokio::test]
async fn catalog_failures_are_counted() -> Result<()> {
    let telemetry = MemoryTelemetry::default();
    let api = Arc::new(FixedLabApi::new());
    api.fail(
        operation::REGIONS,
        ErrorEnvelope::service(502, "bad gateway"),
        None,
    );
    let deps = deps(api.clone(), &telemetry);
    let ctx = RequestContext::new_request();

    let error = filter_options(&ctx, &deps).await.err();
    let status = health(&ctx, &deps).await?;

    assert_eq!(error.map(|error| error.status), Some(Some(502)));
    assert_eq!(api.calls(operation::RESEARCH_FIELDS), 0);
    assert_eq!(telemetry.counter("app.catalog.failed"), 1);
    assert!(status.is_healthy());
    Ok(())
}
