//! Similar labs with the degraded-mode policy.
//!
//! With [`SimilarFallback::Degraded`], a `NotFound` or `Network` failure is
//! replaced by the fixed placeholder set, tagged [`SimilarLabs::Degraded`],
//! logged at `warn` with `source = "fallback"` and counted under
//! `app.similar_labs.degraded`. Any other failure, and every failure under
//! [`SimilarFallback::Surface`], is returned to the caller.

use crate::deps::{LabFinderDeps, fields, tags};
use lab_finder_config::SimilarFallback;
use lab_finder_domain::{SimilarLabs, fallback_similar_labs};
use lab_finder_ports::SimilarLabsRequest;
use lab_finder_shared::{ErrorCode, ErrorEnvelope, ErrorKind, RequestContext, Result};
use serde_json::Value;

/// Upper bound on the similar-labs limit.
pub const MAX_SIMILAR_LIMIT: u32 = 50;

/// Input payload for similar labs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarLabsInput {
    /// Lab to find neighbours for.
    pub lab_id: i64,
    /// Maximum number of labs.
    pub limit: u32,
    /// What to do when the endpoint is unavailable.
    pub fallback: SimilarFallback,
}

/// Fetch labs similar to `input.lab_id`.
pub async fn similar_labs(
    ctx: &RequestContext,
    deps: &LabFinderDeps,
    input: SimilarLabsInput,
) -> Result<SimilarLabs> {
    if input.limit == 0 || input.limit > MAX_SIMILAR_LIMIT {
        return Err(ErrorEnvelope::validation(
            ErrorCode::new("similar", "invalid_limit"),
            format!(
                "limit must be between 1 and {MAX_SIMILAR_LIMIT}, got {}",
                input.limit
            ),
        )
        .with_metadata("limit", input.limit.to_string()));
    }

    let request = SimilarLabsRequest {
        lab_id: input.lab_id,
        limit: input.limit,
    };
    let result = deps
        .run_with_retry(ctx, "app.similar_labs", || deps.api.similar_labs(ctx, request))
        .await;

    let error = match result {
        Ok(labs) => return Ok(SimilarLabs::Live { labs }),
        Err(error) => error,
    };

    let log_fields = || {
        fields([
            ("correlationId", Value::from(ctx.correlation_id().as_str())),
            ("labId", Value::from(input.lab_id)),
            ("policy", Value::from(input.fallback.as_str())),
        ])
    };

    if input.fallback == SimilarFallback::Degraded && can_degrade(&error) {
        let mut degraded = log_fields();
        degraded.insert("source".into(), Value::from("fallback"));
        degraded.insert("reason".into(), Value::from(error.message.as_str()));
        degraded.insert("errorCode".into(), Value::from(error.code.to_string()));
        deps.warn(
            "app.similar_labs.degraded",
            "Similar labs unavailable; serving fallback set",
            degraded,
        );
        deps.count(
            "app.similar_labs.degraded",
            Some(&tags(&[("source", "fallback"), ("kind", error.kind.as_str())])),
        );

        let limit = usize::try_from(input.limit).unwrap_or(usize::MAX);
        let mut labs = fallback_similar_labs(input.lab_id);
        labs.truncate(limit);
        return Ok(SimilarLabs::Degraded {
            labs,
            reason: error.message,
        });
    }

    deps.report_failure("app.similar_labs", &error, log_fields());
    Err(error)
}

const fn can_degrade(error: &ErrorEnvelope) -> bool {
    matches!(error.kind, ErrorKind::NotFound | ErrorKind::Network)
}
