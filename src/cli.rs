// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `encore`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "encore",
    version,
    about = "Run a command multiple times and watch the results live.",
    long_about = None
)]
pub struct CliArgs {
    /// Number of times to run the command.
    #[arg(short = 'n', long, value_name = "N", default_value_t = 1)]
    pub times: u32,

    /// Output format.
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = OutputFormat::Tui)]
    pub format: OutputFormat,

    /// Verbosity of the plain-text output (ignored by the TUI).
    #[arg(long, value_enum, value_name = "LEVEL", default_value_t = Verbosity::Normal)]
    pub verbosity: Verbosity,

    /// Per-run timeout, e.g. "30s" or "5m". Omit for no timeout.
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ENCORE_LOG` or a format-dependent default is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// The command to run. A single token is run through the shell
    /// (`sh -c`), so pipes and globs work; multiple tokens are executed
    /// directly without shell interpretation.
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// How results are reported.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Interactive full-screen view (default).
    Tui,
    /// One line per event on stderr, command output passed through.
    Raw,
    /// A single JSON document on stdout at the end of the session.
    Json,
}

/// Verbosity for the plain-text formatter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Verbosity {
    /// Suppress live command output, report only the final summary.
    Silent,
    Normal,
    /// Also report capture truncation and per-run causes in detail.
    Verbose,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    parse_duration::parse(s).map_err(|e| format!("invalid duration {s:?}: {e}"))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
