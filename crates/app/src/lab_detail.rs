//! Lab detail lookup.

use crate::deps::{LabFinderDeps, fields};
use lab_finder_domain::ResearchLab;
use lab_finder_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde_json::Value;

/// Load one lab by id. A missing lab fails with `NotFound`.
pub async fn lab_detail(
    ctx: &RequestContext,
    deps: &LabFinderDeps,
    lab_id: i64,
) -> Result<ResearchLab> {
    if lab_id <= 0 {
        return Err(ErrorEnvelope::validation(
            ErrorCode::new("lab", "invalid_id"),
            format!("lab id must be positive, got {lab_id}"),
        )
        .with_metadata("labId", lab_id.to_string()));
    }

    let result = deps
        .run_with_retry(ctx, "app.lab_detail", || deps.api.lab_detail(ctx, lab_id))
        .await;

    if let Err(error) = result.as_ref() {
        deps.report_failure(
            "app.lab_detail",
            error,
            fields([
                ("correlationId", Value::from(ctx.correlation_id().as_str())),
                ("labId", Value::from(lab_id)),
            ]),
        );
    }
    result
}
