//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::{
    SearchCommandInput, config_check, config_show, run_fields, run_health, run_lab, run_popular,
    run_regions, run_search, run_similar, run_suggest,
};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use lab_finder_domain::SortMode;
use lab_finder_infra::{
    ApiV1ErrorDto, ApiV1ErrorKind, ConfigFormat, InfraError, LabFinderClient, infra_error_to_api_v1,
};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "lab-finder",
    version,
    about = "Search university research labs",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where the client config comes from.
#[derive(Debug, Args)]
struct ConfigSourceArgs {
    /// Optional config file path (JSON/TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Optional JSON overrides (partial config).
    #[arg(long)]
    overrides_json: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ranked free-text search.
    Search {
        /// Search query text.
        #[arg(value_name = "QUERY")]
        query: String,
        /// Restrict to a region (repeatable).
        #[arg(long = "region", value_name = "REGION")]
        regions: Vec<String>,
        /// Restrict to a research field (repeatable).
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,
        /// Minimum similarity in `0.0..=1.0`.
        #[arg(long)]
        min_similarity: Option<f64>,
        /// Maximum number of results (defaults to `search.defaultLimit`).
        #[arg(long)]
        limit: Option<u32>,
        /// Display order.
        #[arg(long, value_enum, default_value_t = SortArg::Relevance)]
        sort: SortArg,
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Show one lab.
    Lab {
        /// Lab identifier.
        #[arg(value_name = "LAB_ID")]
        lab_id: i64,
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Labs similar to a given lab.
    Similar {
        /// Lab identifier.
        #[arg(value_name = "LAB_ID")]
        lab_id: i64,
        /// Maximum number of labs (defaults to `search.similarLimit`).
        #[arg(long)]
        limit: Option<u32>,
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Query suggestions for a typed prefix.
    Suggest {
        /// Prefix typed so far.
        #[arg(value_name = "PREFIX")]
        query: String,
        /// Maximum number of suggestions.
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Popular search terms.
    Popular {
        /// Maximum number of terms.
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Regions available as filters.
    Regions {
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Research fields available as filters.
    Fields {
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Backend health.
    Health {
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Validate config loading, merging, and normalization.
    Check {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Optional JSON overrides (partial config).
        #[arg(long)]
        overrides_json: Option<String>,
    },
    /// Show the effective config after applying overrides.
    Show {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Optional JSON overrides (partial config).
        #[arg(long)]
        overrides_json: Option<String>,
        /// Rendering for text output.
        #[arg(long, value_enum, default_value_t = ConfigFormatArg::Toml)]
        format: ConfigFormatArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Relevance,
    Name,
}

impl From<SortArg> for SortMode {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Relevance => Self::Relevance,
            SortArg::Name => Self::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ConfigFormatArg {
    Json,
    Toml,
}

impl From<ConfigFormatArg> for ConfigFormat {
    fn from(value: ConfigFormatArg) -> Self {
        match value {
            ConfigFormatArg::Json => Self::Json,
            ConfigFormatArg::Toml => Self::Toml,
        }
    }
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.output.verbose);
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    let env = collect_client_env();
    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Check {
                path,
                overrides_json,
            } => config_check(mode, &env, path.as_deref(), overrides_json.as_deref()),
            ConfigCommands::Show {
                path,
                overrides_json,
                format,
            } => config_show(
                mode,
                &env,
                path.as_deref(),
                overrides_json.as_deref(),
                (*format).into(),
            ),
        },
        Commands::Search {
            query,
            regions,
            fields,
            min_similarity,
            limit,
            sort,
            source,
        } => with_client(mode, &env, source, |client| {
            let input = SearchCommandInput {
                query,
                regions,
                fields,
                min_similarity: *min_similarity,
                limit: *limit,
                sort: (*sort).into(),
            };
            run_search(mode, client, &input)
        }),
        Commands::Lab { lab_id, source } => {
            with_client(mode, &env, source, |client| run_lab(mode, client, *lab_id))
        },
        Commands::Similar {
            lab_id,
            limit,
            source,
        } => with_client(mode, &env, source, |client| {
            run_similar(mode, client, *lab_id, *limit)
        }),
        Commands::Suggest {
            query,
            limit,
            source,
        } => with_client(mode, &env, source, |client| {
            run_suggest(mode, client, query, *limit)
        }),
        Commands::Popular { limit, source } => {
            with_client(mode, &env, source, |client| run_popular(mode, client, *limit))
        },
        Commands::Regions { source } => {
            with_client(mode, &env, source, |client| run_regions(mode, client))
        },
        Commands::Fields { source } => {
            with_client(mode, &env, source, |client| run_fields(mode, client))
        },
        Commands::Health { source } => {
            with_client(mode, &env, source, |client| run_health(mode, client))
        },
    }
}

fn with_client(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    source: &ConfigSourceArgs,
    op: impl FnOnce(&LabFinderClient) -> Result<CliOutput, CliError>,
) -> Result<CliOutput, CliError> {
    let client = match build_client(env, source.config.as_deref(), source.overrides_json.as_deref())
    {
        Ok(client) => client,
        Err(error) => return Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    };
    op(&client)
}

fn build_client(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<LabFinderClient, InfraError> {
    let client = LabFinderClient::from_env_map(env, config_path, overrides_json)?;
    tracing::debug!(base_url = %client.display_base_url(), "client configured");
    Ok(client)
}

pub(crate) fn format_error_output(
    mode: OutputMode,
    error: &InfraError,
    exit_code: ExitCode,
) -> CliOutput {
    let api_error = infra_error_to_api_v1(error);

    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        format_ndjson_error(&api_error)
    } else if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": api_error,
        });
        pretty_json(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"ERR_CORE_INTERNAL\",\"message\":\"internal error\",\"kind\":\"INTERNAL\",\"retriable\":false}}\n".to_string()
        })
    } else {
        format_api_error_text(&api_error)
    };

    CliOutput {
        stdout,
        stderr,
        exit_code,
    }
}

pub(crate) const fn infra_exit_code(error: &InfraError) -> ExitCode {
    ExitCode::for_error_kind(error.kind)
}

/// Next step offered for an error: a retry for every backend failure, a way
/// back to search for a missing lab.
const fn error_hint(error: &ApiV1ErrorDto) -> Option<&'static str> {
    match error.kind {
        ApiV1ErrorKind::Network | ApiV1ErrorKind::Service if error.retriable => {
            Some("the failure may be transient; retry the command")
        },
        ApiV1ErrorKind::Network | ApiV1ErrorKind::Service => {
            Some("retry the command; the backend rejected this request as sent")
        },
        ApiV1ErrorKind::NotFound => Some("lab not found; run `lab-finder search <query>` to find a lab id"),
        ApiV1ErrorKind::Validation | ApiV1ErrorKind::Cancelled | ApiV1ErrorKind::Internal => None,
    }
}

fn format_api_error_text(error: &ApiV1ErrorDto) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str("code: ");
    out.push_str(&error.code);
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&error.message);
    out.push('\n');
    if let Some(status) = error.status {
        out.push_str("httpStatus: ");
        out.push_str(&status.to_string());
        out.push('\n');
    }
    if let Some(hint) = error_hint(error) {
        out.push_str("hint: ");
        out.push_str(hint);
        out.push('\n');
    }

    if let Some(meta) = error.meta.as_ref().filter(|meta| !meta.is_empty()) {
        out.push_str("meta:\n");
        for (key, value) in meta {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }

    out
}

pub(crate) fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

pub(crate) fn pretty_json(payload: &serde_json::Value) -> Result<String, CliError> {
    let mut out = serde_json::to_string_pretty(payload)?;
    out.push('\n');
    Ok(out)
}

pub(crate) fn format_ndjson_summary(
    status: &str,
    kind: &str,
    extra: Option<serde_json::Value>,
) -> String {
    let mut payload = serde_json::Map::new();
    payload.insert(
        "type".to_string(),
        serde_json::Value::String("summary".to_string()),
    );
    payload.insert(
        "status".to_string(),
        serde_json::Value::String(status.to_string()),
    );
    payload.insert(
        "kind".to_string(),
        serde_json::Value::String(kind.to_string()),
    );
    if let Some(serde_json::Value::Object(map)) = extra {
        for (key, value) in map {
            payload.insert(key, value);
        }
    }
    let mut out = serde_json::to_string(&serde_json::Value::Object(payload)).unwrap_or_else(|_| {
        "{\"type\":\"summary\",\"status\":\"error\",\"kind\":\"internal\"}".to_string()
    });
    out.push('\n');
    out
}

fn format_ndjson_error(error: &ApiV1ErrorDto) -> String {
    let payload = serde_json::json!({
        "type": "error",
        "status": "error",
        "error": error,
    });
    let mut out = serde_json::to_string(&payload).unwrap_or_else(|_| {
        "{\"type\":\"error\",\"status\":\"error\",\"error\":{\"code\":\"ERR_CORE_INTERNAL\",\"message\":\"internal error\",\"kind\":\"INTERNAL\",\"retriable\":false}}".to_string()
    });
    out.push('\n');
    out
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

// `VITE_API_BASE_URL` is accepted as an alias for the base URL.
fn collect_client_env() -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with("LAB_FINDER_") || key == "VITE_API_BASE_URL")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;
    use clap::CommandFactory;
    use lab_finder_shared::{ErrorCode, ErrorEnvelope};

    const fn mode(format: OutputFormat) -> OutputMode {
        OutputMode {
            format,
            no_progress: true,
        }
    }

    #[test]
    fn version_flag_is_supported() {
        let result = Cli::command().try_get_matches_from(["lab-finder", "--version"]);
        let is_version = matches!(
            result,
            Err(error) if error.kind() == clap::error::ErrorKind::DisplayVersion
        );

        assert!(is_version, "expected clap to render version");
    }

    #[test]
    fn search_flags_parse() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "lab-finder",
            "--output",
            "json",
            "search",
            "immunology",
            "--region",
            "Kanto",
            "--region",
            "Kansai",
            "--min-similarity",
            "0.7",
            "--sort",
            "name",
        ])?;

        let Commands::Search {
            query,
            regions,
            min_similarity,
            sort,
            ..
        } = cli.command
        else {
            return Err(clap::Error::new(clap::error::ErrorKind::InvalidSubcommand));
        };
        assert_eq!(query, "immunology");
        assert_eq!(regions, vec!["Kanto", "Kansai"]);
        assert!(min_similarity.is_some_and(|value| (value - 0.7).abs() < 1e-9));
        assert_eq!(sort, SortArg::Name);
        assert_eq!(cli.output.output, Some(OutputFormat::Json));
        Ok(())
    }

    #[test]
    fn exit_codes_follow_the_error_taxonomy() {
        let cases = [
            (ErrorEnvelope::validation(ErrorCode::invalid_input(), "bad"), ExitCode::InvalidInput),
            (ErrorEnvelope::not_found("missing"), ExitCode::NotFound),
            (ErrorEnvelope::network("refused"), ExitCode::Unavailable),
            (ErrorEnvelope::service(503, "down"), ExitCode::Unavailable),
            (ErrorEnvelope::cancelled("interrupted"), ExitCode::Interrupted),
            (ErrorEnvelope::internal(ErrorCode::internal(), "bug"), ExitCode::Internal),
        ];
        for (error, expected) in cases {
            assert_eq!(infra_exit_code(&error), expected);
        }
    }

    #[test]
    fn exit_codes_for_cli_errors() -> Result<(), Box<dyn std::error::Error>> {
        let io_error = CliError::Io(io::Error::other("io"));
        let serialization_error = match serde_json::from_str::<serde_json::Value>("not-json") {
            Ok(_) => return Err("expected serialization error".into()),
            Err(error) => CliError::Serialization(error),
        };

        assert_eq!(io_error.exit_code(), ExitCode::Io);
        assert_eq!(serialization_error.exit_code(), ExitCode::Internal);
        Ok(())
    }

    #[test]
    fn service_errors_render_status_and_retry_hint() {
        let output = format_error_output(
            mode(OutputFormat::Text),
            &ErrorEnvelope::service(503, "warming up"),
            ExitCode::Unavailable,
        );

        assert!(output.stdout.starts_with("status: error\n"));
        assert!(output.stdout.contains("httpStatus: 503"));
        assert!(output.stdout.contains("hint:"));
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn rejected_requests_still_offer_a_retry() {
        let output = format_error_output(
            mode(OutputFormat::Text),
            &ErrorEnvelope::service(422, "limit too large"),
            ExitCode::Unavailable,
        );

        assert!(output.stdout.contains("httpStatus: 422"));
        assert!(output.stdout.contains("hint: retry the command"));
    }

    #[test]
    fn missing_labs_point_back_to_search() {
        let output = format_error_output(
            mode(OutputFormat::Text),
            &ErrorEnvelope::not_found("no lab 999"),
            ExitCode::NotFound,
        );

        assert!(output.stdout.contains("hint: lab not found; run `lab-finder search"));
    }

    #[test]
    fn validation_errors_have_no_hint() {
        let output = format_error_output(
            mode(OutputFormat::Text),
            &ErrorEnvelope::validation(ErrorCode::invalid_input(), "blank query"),
            ExitCode::InvalidInput,
        );

        assert!(!output.stdout.contains("hint:"));
    }

    #[test]
    fn ndjson_errors_are_one_line() -> Result<(), Box<dyn std::error::Error>> {
        let output = format_error_output(
            mode(OutputFormat::Ndjson),
            &ErrorEnvelope::not_found("no lab 9"),
            ExitCode::NotFound,
        );
        assert_eq!(output.stdout.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(output.stdout.trim())?;
        assert_eq!(value["error"]["kind"], "NOT_FOUND");
        Ok(())
    }
}
