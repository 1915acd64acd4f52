//! Session-scoped client facade over the app use cases.

use crate::InfraResult;
use crate::config_check::load_effective_config;
use crate::observability::Observability;
use crate::runtime::run_async_with_ctx;
use lab_finder_adapters::{HttpLabApi, HttpLabApiConfig};
use lab_finder_app::{
    FilterOptions, LabFinderDeps, SearchLabsInput, SimilarLabsInput, filter_options, health,
    lab_detail, popular_searches, search_labs, similar_labs, suggestions,
};
use lab_finder_config::ValidatedClientConfig;
use lab_finder_domain::{
    HealthStatus, ResearchLab, SearchFilterState, SearchResponse, SimilarLabs, Suggestion,
};
use lab_finder_ports::LabApiPort;
use lab_finder_shared::{RequestContext, strip_url_credentials};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Lab Finder client: built once per session, then shared by every command.
///
/// Each call runs on its own request context (fresh correlation id) and
/// blocks until the use case finishes or Ctrl-C cancels it.
pub struct LabFinderClient {
    config: ValidatedClientConfig,
    api: Arc<dyn LabApiPort>,
    observability: Observability,
}

impl LabFinderClient {
    /// Load config from an env snapshot and optional sources, then build an
    /// HTTP-backed client with stderr observability.
    pub fn from_env_map(
        env: &BTreeMap<String, String>,
        config_path: Option<&Path>,
        overrides_json: Option<&str>,
    ) -> InfraResult<Self> {
        let config = load_effective_config(env, config_path, overrides_json)?;
        let observability = Observability::from_env(config.logging.level);
        Self::from_config(config, observability)
    }

    /// Build an HTTP-backed client from a validated config.
    pub fn from_config(
        config: ValidatedClientConfig,
        observability: Observability,
    ) -> InfraResult<Self> {
        let api = HttpLabApi::new(&HttpLabApiConfig::from_client_config(&config))?;
        tracing::debug!(base_url = %api.display_base_url(), "lab api client ready");
        Ok(Self::with_api(config, Arc::new(api), observability))
    }

    /// Build a client over any [`LabApiPort`] implementation.
    #[must_use]
    pub fn with_api(
        config: ValidatedClientConfig,
        api: Arc<dyn LabApiPort>,
        observability: Observability,
    ) -> Self {
        Self {
            config,
            api,
            observability,
        }
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &ValidatedClientConfig {
        &self.config
    }

    /// Backend base URL with credentials stripped.
    #[must_use]
    pub fn display_base_url(&self) -> String {
        strip_url_credentials(self.config.api_base_url())
    }

    /// Ranked search. `limit` defaults to `search.defaultLimit`.
    pub fn search(
        &self,
        query: &str,
        filters: SearchFilterState,
        limit: Option<u32>,
    ) -> InfraResult<SearchResponse> {
        let input = SearchLabsInput {
            query: query.into(),
            filters,
            limit: limit.unwrap_or(self.config.search.default_limit),
        };
        self.run(move |ctx, deps| async move { search_labs(&ctx, &deps, input).await })
    }

    /// Lab detail by id.
    pub fn lab_detail(&self, lab_id: i64) -> InfraResult<ResearchLab> {
        self.run(move |ctx, deps| async move { lab_detail(&ctx, &deps, lab_id).await })
    }

    /// Similar labs under the configured fallback policy. `limit` defaults to
    /// `search.similarLimit`.
    pub fn similar_labs(&self, lab_id: i64, limit: Option<u32>) -> InfraResult<SimilarLabs> {
        let input = SimilarLabsInput {
            lab_id,
            limit: limit.unwrap_or(self.config.search.similar_limit),
            fallback: self.config.similar_labs.fallback,
        };
        self.run(move |ctx, deps| async move { similar_labs(&ctx, &deps, input).await })
    }

    /// Query suggestions for a typed prefix.
    pub fn suggestions(&self, query: &str, limit: u32) -> InfraResult<Vec<Suggestion>> {
        let query = query.to_string();
        self.run(move |ctx, deps| async move { suggestions(&ctx, &deps, &query, limit).await })
    }

    /// Popular search terms.
    pub fn popular_searches(&self, limit: u32) -> InfraResult<Vec<String>> {
        self.run(move |ctx, deps| async move { popular_searches(&ctx, &deps, limit).await })
    }

    /// Region and research-field choices for the filter panel.
    pub fn filter_options(&self) -> InfraResult<FilterOptions> {
        self.run(|ctx, deps| async move { filter_options(&ctx, &deps).await })
    }

    /// Backend health.
    pub fn health(&self) -> InfraResult<HealthStatus> {
        self.run(|ctx, deps| async move { health(&ctx, &deps).await })
    }

    fn deps_for(&self, ctx: &RequestContext) -> LabFinderDeps {
        let mut deps =
            LabFinderDeps::new(Arc::clone(&self.api)).with_retry(self.config.retry_policy());
        if let Some(logger) = self.observability.scope_logger(ctx) {
            deps = deps.with_logger(logger);
        }
        if let Some(telemetry) = self.observability.telemetry.as_ref() {
            deps = deps.with_telemetry(Arc::clone(telemetry));
        }
        deps
    }

    fn run<F, T>(&self, op: impl FnOnce(RequestContext, LabFinderDeps) -> F) -> InfraResult<T>
    where
        F: Future<Output = InfraResult<T>>,
    {
        let ctx = RequestContext::new_request();
        let deps = self.deps_for(&ctx);
        run_async_with_ctx(ctx, move |ctx| op(ctx, deps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_finder_adapters::lab_api::fixed::operation;
    use lab_finder_adapters::{FixedLabApi, JsonLogger, MemoryLogSink};
    use lab_finder_config::ClientEnv;
    use lab_finder_domain::{RawSearchResult, normalize};
    use lab_finder_shared::{ErrorEnvelope, ErrorKind};

    fn config(overrides: &str) -> InfraResult<ValidatedClientConfig> {
        lab_finder_config::load_client_config_from_sources(
            None,
            Some(overrides),
            &ClientEnv::default(),
        )
    }

    fn record(id: i64, name: &str) -> lab_finder_domain::SearchResultRecord {
        normalize(RawSearchResult {
            id: Some(id),
            name: Some(name.to_string()),
            similarity_score: Some(0.8),
            ..RawSearchResult::default()
        })
    }

    #[test]
    fn search_uses_the_configured_default_limit() -> InfraResult<()> {
        let api = Arc::new(FixedLabApi::new().with_results(vec![
            record(1, "Immunology Lab A"),
            record(2, "Immunology Lab B"),
            record(3, "Immunology Lab C"),
        ]));
        let client = LabFinderClient::with_api(
            config(r#"{"search":{"defaultLimit":2}}"#)?,
            api.clone(),
            Observability::disabled(),
        );

        let response = client.search("immunology", SearchFilterState::default(), None)?;

        assert_eq!(response.results.len(), 2);
        assert_eq!(api.calls(operation::SEARCH), 1);
        Ok(())
    }

    #[test]
    fn surface_policy_from_config_reaches_the_use_case() -> InfraResult<()> {
        let client = LabFinderClient::with_api(
            config(r#"{"similarLabs":{"fallback":"surface"}}"#)?,
            Arc::new(FixedLabApi::new()),
            Observability::disabled(),
        );

        let error = client.similar_labs(4, None).err();

        assert_eq!(error.map(|error| error.kind), Some(ErrorKind::NotFound));
        Ok(())
    }

    #[test]
    fn degraded_policy_uses_the_configured_similar_limit() -> InfraResult<()> {
        let client = LabFinderClient::with_api(
            config(r#"{"search":{"similarLimit":2}}"#)?,
            Arc::new(FixedLabApi::new()),
            Observability::disabled(),
        );

        let labs = client.similar_labs(4, None)?;

        assert!(labs.is_degraded());
        assert_eq!(labs.labs().len(), 2);
        Ok(())
    }

    #[test]
    fn every_call_logs_under_its_own_correlation_id() -> InfraResult<()> {
        let sink = Arc::new(MemoryLogSink::default());
        let observability = Observability {
            logger: Some(Arc::new(JsonLogger::new(sink.clone()))),
            telemetry: None,
        };
        let client = LabFinderClient::with_api(
            config("{}")?,
            Arc::new(FixedLabApi::new().with_results(vec![record(1, "Immunology Lab")])),
            observability,
        );

        client.search("immunology", SearchFilterState::default(), None)?;
        client.search("immunology", SearchFilterState::default(), None)?;

        let ids: Vec<String> = sink
            .json_lines()
            .iter()
            .filter(|line| line["event"] == "app.search.start")
            .filter_map(|line| line["fields"]["correlationId"].as_str().map(str::to_string))
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        Ok(())
    }

    #[test]
    fn retry_policy_comes_from_config() -> InfraResult<()> {
        let api = Arc::new(FixedLabApi::new());
        api.fail(
            operation::SEARCH,
            ErrorEnvelope::network("connection refused"),
            None,
        );
        let client = LabFinderClient::with_api(
            config(r#"{"retry":{"maxAttempts":2,"baseDelayMs":1,"maxDelayMs":1}}"#)?,
            api.clone(),
            Observability::disabled(),
        );

        let error = client
            .search("immunology", SearchFilterState::default(), None)
            .err();

        assert_eq!(error.map(|error| error.kind), Some(ErrorKind::Network));
        assert_eq!(api.calls(operation::SEARCH), 2);
        Ok(())
    }
}
