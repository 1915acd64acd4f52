//! Config check/show handlers.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, log_info, pretty_json};
use lab_finder_infra::{
    ConfigFormat, load_effective_config_json, render_effective_config, validate_env_parsing,
};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

/// Validate env overrides, the config file and JSON overrides together.
pub fn config_check(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<CliOutput, CliError> {
    let checked = validate_env_parsing(env)
        .and_then(|()| load_effective_config_json(env, path, overrides_json));
    let config_json = match checked {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error, ExitCode::InvalidInput)),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.no_progress);

    let config_value: serde_json::Value = serde_json::from_str(config_json.trim())?;
    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "config", None)
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "configPath": path.map(|value| value.to_string_lossy().to_string()),
            "effectiveConfig": config_value,
        }))?
    } else {
        let mut out = String::from("status: ok\n");
        if let Some(path) = path {
            let _ = writeln!(out, "path: {}", path.to_string_lossy());
        }
        let _ = writeln!(out, "backend: {}", text_field(&config_value["api"]["baseUrl"]));
        let _ = writeln!(
            out,
            "similar labs: {}",
            text_field(&config_value["similarLabs"]["fallback"])
        );
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn text_field(value: &serde_json::Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}

/// Show the effective config. Text mode renders `format` (JSON or TOML).
pub fn config_show(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
    overrides_json: Option<&str>,
    format: ConfigFormat,
) -> Result<CliOutput, CliError> {
    let rendered_format = if mode.is_machine() {
        ConfigFormat::Json
    } else {
        format
    };
    let rendered = match render_effective_config(env, path, overrides_json, rendered_format) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error, ExitCode::InvalidInput)),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        let config_value: serde_json::Value = serde_json::from_str(rendered.trim())?;
        format_ndjson_summary(
            "ok",
            "config",
            Some(serde_json::json!({"effectiveConfig": config_value})),
        )
    } else if mode.is_json() {
        let config_value: serde_json::Value = serde_json::from_str(rendered.trim())?;
        pretty_json(&serde_json::json!({
            "status": "ok",
            "configPath": path.map(|value| value.to_string_lossy().to_string()),
            "effectiveConfig": config_value,
        }))?
    } else {
        let mut out = String::new();
        out.push_str("status: ok\nconfig:\n");
        out.push_str(&rendered);
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}
