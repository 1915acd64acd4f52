//! Output selection for lab-finder commands.

use clap::{Args, ValueEnum};

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Ranked lines for a terminal.
    Text,
    /// One pretty JSON document.
    Json,
    /// One JSON object per lab, then a summary line.
    Ndjson,
}

impl OutputFormat {
    /// An explicit `--output` wins; `--json` beats `--agent`.
    const fn resolve(explicit: Option<Self>, json: bool, agent: bool) -> Self {
        match explicit {
            Some(format) => format,
            None if json => Self::Json,
            None if agent => Self::Ndjson,
            None => Self::Text,
        }
    }
}

/// Global output flags shared by every subcommand.
#[derive(Debug, Args)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag is an independent on/off switch on the command line"
)]
pub struct OutputArgs {
    /// Result format.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
    /// Scripting defaults: NDJSON results and no status lines on stderr.
    #[arg(long, global = true)]
    pub agent: bool,
    /// Drop status lines from stderr.
    #[arg(long, visible_alias = "quiet", global = true)]
    pub no_progress: bool,
    /// Debug diagnostics on stderr (`RUST_LOG` takes precedence).
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
    /// Shorthand for `--output json`.
    #[arg(long, global = true, hide = true)]
    pub json: bool,
}

/// Resolved output settings for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub no_progress: bool,
}

impl OutputMode {
    #[must_use]
    pub const fn from_args(args: &OutputArgs) -> Self {
        Self {
            format: OutputFormat::resolve(args.output, args.json, args.agent),
            no_progress: args.agent || args.no_progress,
        }
    }

    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    #[must_use]
    pub const fn is_ndjson(self) -> bool {
        matches!(self.format, OutputFormat::Ndjson)
    }

    /// JSON or NDJSON.
    #[must_use]
    pub const fn is_machine(self) -> bool {
        !matches!(self.format, OutputFormat::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(output: Option<OutputFormat>, agent: bool, json: bool) -> OutputArgs {
        OutputArgs {
            output,
            agent,
            no_progress: false,
            verbose: false,
            json,
        }
    }

    #[test]
    fn explicit_output_wins_over_agent() {
        let mode = OutputMode::from_args(&args(Some(OutputFormat::Text), true, false));
        assert_eq!(mode.format, OutputFormat::Text);
        assert!(mode.no_progress);
        assert!(!mode.is_machine());
    }

    #[test]
    fn agent_means_ndjson_unless_json_is_asked_for() {
        assert!(OutputMode::from_args(&args(None, true, false)).is_ndjson());
        assert!(OutputMode::from_args(&args(None, true, true)).is_json());
        assert!(OutputMode::from_args(&args(None, false, false)).format == OutputFormat::Text);
    }
}
