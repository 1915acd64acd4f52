//! Catalog lookups: suggestions, popular searches, filter choices, health.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, infra_exit_code, pretty_json};
use lab_finder_domain::HealthStatus;
use lab_finder_infra::{InfraResult, LabFinderClient};
use serde::Serialize;
use std::fmt::Write;

/// Run the suggestions command.
pub fn run_suggest(
    mode: OutputMode,
    client: &LabFinderClient,
    query: &str,
    limit: u32,
) -> Result<CliOutput, CliError> {
    render(mode, "suggestions", client.suggestions(query, limit), |out, items| {
        for item in items {
            let _ = writeln!(out, "{} ({})", item.text, item.category);
        }
    })
}

/// Run the popular-searches command.
pub fn run_popular(
    mode: OutputMode,
    client: &LabFinderClient,
    limit: u32,
) -> Result<CliOutput, CliError> {
    render(mode, "popular", client.popular_searches(limit), push_lines)
}

/// Run the regions command.
pub fn run_regions(mode: OutputMode, client: &LabFinderClient) -> Result<CliOutput, CliError> {
    let regions = client.filter_options().map(|options| options.regions);
    render(mode, "regions", regions, push_lines)
}

/// Run the research-fields command.
pub fn run_fields(mode: OutputMode, client: &LabFinderClient) -> Result<CliOutput, CliError> {
    let fields = client.filter_options().map(|options| options.research_fields);
    render(mode, "fields", fields, push_lines)
}

/// Run the health command. An unhealthy backend exits with `Unavailable`.
pub fn run_health(mode: OutputMode, client: &LabFinderClient) -> Result<CliOutput, CliError> {
    let health = match client.health() {
        Ok(health) => health,
        Err(error) => return Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    };
    let exit_code = if health.is_healthy() {
        ExitCode::Ok
    } else {
        ExitCode::Unavailable
    };

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary(
            "ok",
            "health",
            Some(serde_json::json!({"service": health})),
        )
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({"status": "ok", "service": health}))?
    } else {
        format_health_text(&health)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code,
    })
}

fn format_health_text(health: &HealthStatus) -> String {
    let mut out = String::new();
    out.push_str("status: ok\n");
    let _ = writeln!(out, "service: {}", health.status);
    if !health.version.is_empty() {
        let _ = writeln!(out, "version: {}", health.version);
    }
    if !health.message.is_empty() {
        let _ = writeln!(out, "message: {}", health.message);
    }
    out
}

fn push_lines(out: &mut String, items: &[String]) {
    for item in items {
        out.push_str(item);
        out.push('\n');
    }
}

// Shared shape for list lookups: one item per line in text, an `items` array
// in JSON, one `item` record per line plus a summary in NDJSON.
fn render<T: Serialize>(
    mode: OutputMode,
    kind: &str,
    items: InfraResult<Vec<T>>,
    text: impl FnOnce(&mut String, &[T]),
) -> Result<CliOutput, CliError> {
    let items = match items {
        Ok(items) => items,
        Err(error) => return Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    };

    let stdout = if mode.is_ndjson() {
        let mut out = String::new();
        for item in &items {
            out.push_str(&serde_json::to_string(
                &serde_json::json!({"type": "item", "item": item}),
            )?);
            out.push('\n');
        }
        out.push_str(&format_ndjson_summary(
            "ok",
            kind,
            Some(serde_json::json!({"count": items.len()})),
        ));
        out
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({"status": "ok", "kind": kind, "items": items}))?
    } else {
        let mut out = String::from("status: ok\n");
        if items.is_empty() {
            let _ = writeln!(out, "{kind}: none");
        }
        text(&mut out, &items);
        out
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
