//! Similar-labs command handler.

use super::push_ranked_line;
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, infra_exit_code, pretty_json};
use lab_finder_domain::{SimilarLabs, match_percent};
use lab_finder_infra::LabFinderClient;
use std::fmt::Write;

/// Run the similar-labs command.
pub fn run_similar(
    mode: OutputMode,
    client: &LabFinderClient,
    lab_id: i64,
    limit: Option<u32>,
) -> Result<CliOutput, CliError> {
    let similar = match client.similar_labs(lab_id, limit) {
        Ok(similar) => similar,
        Err(error) => return Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    };

    let stdout = if mode.is_ndjson() {
        format_similar_ndjson(&similar)?
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "labId": lab_id,
            "similar": similar,
        }))?
    } else {
        format_similar_text(&similar)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

const fn source_label(similar: &SimilarLabs) -> &'static str {
    if similar.is_degraded() {
        "fallback"
    } else {
        "live"
    }
}

fn format_similar_ndjson(similar: &SimilarLabs) -> Result<String, CliError> {
    let source = source_label(similar);
    let mut out = String::new();
    for (index, record) in similar.labs().iter().enumerate() {
        let payload = serde_json::json!({
            "type": "result",
            "source": source,
            "rank": index + 1,
            "id": record.id,
            "name": record.name,
            "matchPercent": match_percent(record.similarity_score),
        });
        out.push_str(&serde_json::to_string(&payload)?);
        out.push('\n');
    }
    out.push_str(&format_ndjson_summary(
        "ok",
        "similar",
        Some(serde_json::json!({
            "count": similar.labs().len(),
            "source": source,
        })),
    ));
    Ok(out)
}

fn format_similar_text(similar: &SimilarLabs) -> String {
    let mut out = String::new();
    out.push_str("status: ok\n");
    let _ = writeln!(out, "source: {}", source_label(similar));
    if let SimilarLabs::Degraded { reason, .. } = similar {
        let _ = writeln!(out, "note: placeholder labs shown because {reason}");
    }
    for (index, record) in similar.labs().iter().enumerate() {
        push_ranked_line(&mut out, index + 1, record);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_finder_domain::fallback_similar_labs;

    #[test]
    fn degraded_sets_are_labelled_in_every_format() -> Result<(), CliError> {
        let similar = SimilarLabs::Degraded {
            labs: fallback_similar_labs(7),
            reason: "the similar-labs endpoint is unavailable".to_string(),
        };

        let text = format_similar_text(&similar);
        assert!(text.contains("source: fallback"));
        assert!(text.contains("note: placeholder labs"));

        let ndjson = format_similar_ndjson(&similar)?;
        assert!(
            ndjson
                .lines()
                .all(|line| line.contains("\"source\":\"fallback\""))
        );
        Ok(())
    }

    #[test]
    fn live_sets_carry_no_note() {
        let similar = SimilarLabs::Live { labs: Vec::new() };
        let text = format_similar_text(&similar);
        assert!(text.contains("source: live"));
        assert!(!text.contains("note:"));
    }
}
