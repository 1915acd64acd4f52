//! HTTP adapter for the Lab Finder backend.

use lab_finder_api::v1::{
    ApiV1HealthDto, ApiV1ResearchLabDto, ApiV1SuggestionDto, error_message_from_body,
    health_from_api_v1, research_lab_from_api_v1, search_request_to_api_v1,
    search_response_from_value, similar_labs_from_value, suggestion_from_api_v1,
};
use lab_finder_config::ValidatedClientConfig;
use lab_finder_ports::{
    BoxFuture, HealthStatus, LabApiPort, ResearchLab, SearchRequest, SearchResponse,
    SearchResultRecord, SimilarLabsRequest, Suggestion, SuggestionsRequest,
};
use lab_finder_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result, strip_url_credentials};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// HTTP adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpLabApiConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: Box<str>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl HttpLabApiConfig {
    /// Build from the validated client config.
    #[must_use]
    pub fn from_client_config(config: &ValidatedClientConfig) -> Self {
        Self {
            base_url: config.api_base_url().into(),
            timeout_ms: config.api.timeout_ms,
        }
    }
}

/// `reqwest`-backed implementation of [`LabApiPort`].
///
/// One instance is built per session and shared; it holds the connection
/// pool. Each port call issues exactly one request.
pub struct HttpLabApi {
    client: reqwest::Client,
    base_url: Box<str>,
}

impl HttpLabApi {
    /// Create the adapter.
    pub fn new(config: &HttpLabApiConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ErrorEnvelope::validation(
                ErrorCode::invalid_input(),
                "base url must be non-empty",
            ));
        }
        if config.timeout_ms == 0 {
            return Err(ErrorEnvelope::validation(
                ErrorCode::invalid_input(),
                "timeout must be greater than zero",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|error| {
                ErrorEnvelope::internal(
                    ErrorCode::new("http", "client_init_failed"),
                    format!("failed to build HTTP client: {error}"),
                )
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Base URL with credentials stripped, for diagnostics.
    #[must_use]
    pub fn display_base_url(&self) -> String {
        strip_url_credentials(&self.base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request and return the status and the full body.
    async fn send(
        &self,
        ctx: &RequestContext,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<(StatusCode, Vec<u8>)> {
        ctx.ensure_not_cancelled(operation)?;
        tracing::debug!(
            operation,
            correlation_id = ctx.correlation_id().as_str(),
            "sending lab api request"
        );

        let response = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled_error(operation)),
            result = request.send() => result.map_err(|error| map_reqwest_error(error, operation))?,
        };

        let status = response.status();
        let payload = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled_error(operation)),
            result = response.bytes() => result.map_err(|error| map_reqwest_error(error, operation))?,
        };

        tracing::debug!(
            operation,
            status = status.as_u16(),
            bytes = payload.len(),
            "lab api response received"
        );
        Ok((status, payload.to_vec()))
    }

    /// Send, fail on non-2xx, and decode the body as JSON.
    async fn send_json(
        &self,
        ctx: &RequestContext,
        request: reqwest::RequestBuilder,
        operation: &'static str,
        not_found: Option<&str>,
    ) -> Result<Value> {
        let (status, payload) = self.send(ctx, request, operation).await?;
        if status == StatusCode::NOT_FOUND {
            if let Some(message) = not_found {
                return Err(ErrorEnvelope::not_found(message).with_metadata("operation", operation));
            }
        }
        if !status.is_success() {
            return Err(map_http_error(status, &payload, operation));
        }
        decode_json(&payload, operation)
    }

    async fn string_list(
        &self,
        ctx: &RequestContext,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<Vec<String>> {
        let value = self.send_json(ctx, request, operation, None).await?;
        Ok(string_items(&value))
    }
}

impl LabApiPort for HttpLabApi {
    fn search(
        &self,
        ctx: &RequestContext,
        request: SearchRequest,
    ) -> BoxFuture<'_, Result<SearchResponse>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let body = search_request_to_api_v1(&request);
            let builder = self.client.post(self.url("/api/search/")).json(&body);
            let value = self
                .send_json(&ctx, builder, "lab_api.search", None)
                .await?;
            Ok(search_response_from_value(&value, request.query()))
        })
    }

    fn lab_detail(&self, ctx: &RequestContext, lab_id: i64) -> BoxFuture<'_, Result<ResearchLab>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let builder = self.client.get(self.url(&format!("/api/labs/{lab_id}")));
            let not_found = format!("lab {lab_id} not found");
            let value = self
                .send_json(&ctx, builder, "lab_api.lab_detail", Some(&not_found))
                .await?;
            let dto: ApiV1ResearchLabDto = serde_json::from_value(value).map_err(|error| {
                decode_error(
                    "lab_api.lab_detail",
                    &format!("lab detail did not match the expected shape: {error}"),
                )
            })?;
            Ok(research_lab_from_api_v1(dto))
        })
    }

    fn similar_labs(
        &self,
        ctx: &RequestContext,
        request: SimilarLabsRequest,
    ) -> BoxFuture<'_, Result<Vec<SearchResultRecord>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let builder = self
                .client
                .get(self.url(&format!("/api/labs/similar/{}", request.lab_id)))
                .query(&[("limit", request.limit)]);
            let not_found = format!("no similar labs for lab {}", request.lab_id);
            let value = self
                .send_json(&ctx, builder, "lab_api.similar_labs", Some(&not_found))
                .await?;
            Ok(similar_labs_from_value(&value))
        })
    }

    fn suggestions(
        &self,
        ctx: &RequestContext,
        request: SuggestionsRequest,
    ) -> BoxFuture<'_, Result<Vec<Suggestion>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let limit = request.limit.to_string();
            let builder = self
                .client
                .get(self.url("/api/search/suggestions"))
                .query(&[("q", request.query.as_ref()), ("limit", limit.as_str())]);
            let value = self
                .send_json(&ctx, builder, "lab_api.suggestions", None)
                .await?;
            let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
            // Entries that are not objects with a `text` are skipped.
            Ok(items
                .iter()
                .filter_map(|item| serde_json::from_value::<ApiV1SuggestionDto>(item.clone()).ok())
                .map(suggestion_from_api_v1)
                .collect())
        })
    }

    fn popular_searches(
        &self,
        ctx: &RequestContext,
        limit: u32,
    ) -> BoxFuture<'_, Result<Vec<String>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let builder = self
                .client
                .get(self.url("/api/search/popular"))
                .query(&[("limit", limit)]);
            self.string_list(&ctx, builder, "lab_api.popular_searches")
                .await
        })
    }

    fn regions(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<String>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let builder = self.client.get(self.url("/api/universities/regions"));
            self.string_list(&ctx, builder, "lab_api.regions").await
        })
    }

    fn research_fields(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<String>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let builder = self
                .client
                .get(self.url("/api/universities/research-fields"));
            self.string_list(&ctx, builder, "lab_api.research_fields")
                .await
        })
    }

    fn health(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<HealthStatus>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let builder = self.client.get(self.url("/health"));
            let value = self.send_json(&ctx, builder, "lab_api.health", None).await?;
            let dto: ApiV1HealthDto = serde_json::from_value(value).map_err(|error| {
                decode_error(
                    "lab_api.health",
                    &format!("health response did not match the expected shape: {error}"),
                )
            })?;
            Ok(health_from_api_v1(dto))
        })
    }
}

fn string_items(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn decode_json(payload: &[u8], operation: &'static str) -> Result<Value> {
    serde_json::from_slice(payload).map_err(|error| {
        decode_error(
            operation,
            &format!("response body is not valid JSON: {error}"),
        )
    })
}

fn decode_error(operation: &'static str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope::internal(ErrorCode::decode(), message).with_metadata("operation", operation)
}

fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("request cancelled").with_metadata("operation", operation)
}

fn map_reqwest_error(error: reqwest::Error, operation: &'static str) -> ErrorEnvelope {
    // reqwest errors embed the request URL; drop it so credentials never leak.
    let error = error.without_url();
    let envelope = if error.is_timeout() {
        ErrorEnvelope::network_with_code(ErrorCode::timeout(), "request timed out")
    } else if error.is_connect() {
        ErrorEnvelope::network(format!("connection failed: {error}"))
    } else {
        ErrorEnvelope::network(format!("request failed: {error}"))
    };
    envelope.with_metadata("operation", operation)
}

fn map_http_error(status: StatusCode, payload: &[u8], operation: &'static str) -> ErrorEnvelope {
    let code = status.as_u16();
    let message = error_message_from_body(payload)
        .unwrap_or_else(|| format!("request failed with status {code}"));
    ErrorEnvelope::service(code, message).with_metadata("operation", operation)
}
