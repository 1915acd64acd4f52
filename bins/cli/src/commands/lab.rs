//! Lab detail command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, infra_exit_code, pretty_json};
use lab_finder_domain::ResearchLab;
use lab_finder_infra::LabFinderClient;
use std::fmt::Write;

/// Run the lab detail command.
pub fn run_lab(
    mode: OutputMode,
    client: &LabFinderClient,
    lab_id: i64,
) -> Result<CliOutput, CliError> {
    let lab = match client.lab_detail(lab_id) {
        Ok(lab) => lab,
        Err(error) => return Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    };

    let stdout = if mode.is_ndjson() {
        let mut out = serde_json::to_string(&serde_json::json!({"type": "lab", "lab": lab}))?;
        out.push('\n');
        out.push_str(&format_ndjson_summary("ok", "lab", None));
        out
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({"status": "ok", "lab": lab}))?
    } else {
        format_lab_text(&lab)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_lab_text(lab: &ResearchLab) -> String {
    let optional = |value: Option<&String>| value.map_or("-", String::as_str).to_string();

    let mut out = String::new();
    out.push_str("status: ok\n");
    let _ = writeln!(out, "id: {}", lab.id);
    let _ = writeln!(out, "name: {}", lab.name);
    let _ = writeln!(out, "professor: {}", optional(lab.professor_name.as_ref()));
    let _ = writeln!(
        out,
        "university: {} ({})",
        lab.university.name, lab.university.university_type
    );
    let _ = writeln!(
        out,
        "location: {}, {}",
        lab.university.prefecture, lab.university.region
    );
    if let Some(department) = lab.department.as_ref() {
        let _ = writeln!(out, "department: {department}");
    }
    let _ = writeln!(out, "field: {}", lab.research_field);
    if let Some(speciality) = lab.speciality.as_ref() {
        let _ = writeln!(out, "speciality: {speciality}");
    }
    let _ = writeln!(out, "theme: {}", lab.research_theme);
    let _ = writeln!(out, "content: {}", lab.research_content);
    let keywords = lab.keyword_list();
    if !keywords.is_empty() {
        let _ = writeln!(out, "keywords: {}", keywords.join(", "));
    }
    if let Some(url) = lab.lab_url.as_ref() {
        let _ = writeln!(out, "url: {}", url.as_str());
    }
    out
}
