//! Search command handler.

use super::push_ranked_line;
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, infra_exit_code, pretty_json};
use lab_finder_domain::{
    SearchFilterState, SearchResponse, SortMode, match_percent, match_tier, order,
};
use lab_finder_infra::LabFinderClient;
use lab_finder_shared::ErrorEnvelope;
use std::fmt::Write;

/// Inputs for search command execution.
pub struct SearchCommandInput<'a> {
    pub query: &'a str,
    pub regions: &'a [String],
    pub fields: &'a [String],
    pub min_similarity: Option<f64>,
    pub limit: Option<u32>,
    pub sort: SortMode,
}

/// Run the search command.
pub fn run_search(
    mode: OutputMode,
    client: &LabFinderClient,
    input: &SearchCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let filters = match build_filters(input) {
        Ok(filters) => filters,
        Err(error) => return Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    };

    match client.search(input.query, filters, input.limit) {
        Ok(response) => format_search_output(mode, response, input.sort),
        Err(error) => Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    }
}

fn build_filters(input: &SearchCommandInput<'_>) -> Result<SearchFilterState, ErrorEnvelope> {
    let mut filters = SearchFilterState::default();
    for region in input.regions {
        filters.add_region(region.as_str());
    }
    for field in input.fields {
        filters.add_field(field.as_str());
    }
    if let Some(value) = input.min_similarity {
        filters.set_min_similarity(value)?;
    }
    Ok(filters)
}

fn format_search_output(
    mode: OutputMode,
    mut response: SearchResponse,
    sort: SortMode,
) -> Result<CliOutput, CliError> {
    response.results = order(std::mem::take(&mut response.results), sort);

    let stdout = if mode.is_ndjson() {
        format_search_ndjson(&response)?
    } else if mode.is_json() {
        format_search_json(&response, sort)?
    } else {
        format_search_text(&response, sort)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_search_json(response: &SearchResponse, sort: SortMode) -> Result<String, CliError> {
    pretty_json(&serde_json::json!({
        "status": "ok",
        "query": response.query,
        "totalResults": response.total_results,
        "searchTimeMs": response.search_time_ms,
        "sort": sort.as_str(),
        "results": response.results,
    }))
}

fn format_search_ndjson(response: &SearchResponse) -> Result<String, CliError> {
    let mut out = String::new();
    for (index, record) in response.results.iter().enumerate() {
        let payload = serde_json::json!({
            "type": "result",
            "rank": index + 1,
            "id": record.id,
            "name": record.name,
            "universityName": record.university_name,
            "similarityScore": record.similarity_score,
            "matchPercent": match_percent(record.similarity_score),
            "matchTier": match_tier(record.similarity_score),
        });
        out.push_str(&serde_json::to_string(&payload)?);
        out.push('\n');
    }
    out.push_str(&format_ndjson_summary(
        "ok",
        "search",
        Some(serde_json::json!({
            "count": response.results.len(),
            "totalResults": response.total_results,
            "searchTimeMs": response.search_time_ms,
        })),
    ));
    Ok(out)
}

fn format_search_text(response: &SearchResponse, sort: SortMode) -> String {
    let mut out = String::new();
    out.push_str("status: ok\n");
    out.push_str(&response.summary());
    out.push('\n');

    if response.is_empty() {
        out.push_str("no labs matched; try fewer filters or --min-similarity 0.3\n");
        return out;
    }

    let _ = writeln!(out, "sort: {sort}");
    for (index, record) in response.results.iter().enumerate() {
        push_ranked_line(&mut out, index + 1, record);
        let _ = writeln!(
            out,
            "   {} | {}, {}",
            record.professor_name, record.prefecture, record.region
        );
        let _ = writeln!(
            out,
            "   {}: {}",
            record.research_field, record.research_theme
        );
    }
    out
}
