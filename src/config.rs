// src/config.rs

//! Validated run configuration.
//!
//! [`RunConfig`] is built from the parsed CLI arguments via `TryFrom`, which
//! is also where all static validation happens (non-empty command, run count
//! of at least one). The core components only ever see a validated,
//! immutable config.

use std::time::Duration;

use crate::cli::{CliArgs, OutputFormat, Verbosity};
use crate::errors::{EncoreError, Result};

/// Immutable configuration for one session.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Command tokens. One token runs through the shell, several run the
    /// first as the executable with the rest as literal arguments.
    pub command: Vec<String>,
    /// How many times to run the command (>= 1).
    pub times: u32,
    pub verbosity: Verbosity,
    pub format: OutputFormat,
    /// Per-run timeout; `None` means unbounded.
    pub timeout: Option<Duration>,
}

impl RunConfig {
    /// The command as a single display string.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

impl TryFrom<CliArgs> for RunConfig {
    type Error = EncoreError;

    fn try_from(args: CliArgs) -> Result<Self> {
        validate(&args)?;

        // A timeout of zero means "no timeout".
        let timeout = args.timeout.filter(|t| !t.is_zero());

        Ok(RunConfig {
            command: args.command,
            times: args.times,
            verbosity: args.verbosity,
            format: args.format,
            timeout,
        })
    }
}

fn validate(args: &CliArgs) -> Result<()> {
    if args.command.is_empty() || args.command.iter().all(|t| t.trim().is_empty()) {
        return Err(EncoreError::ConfigError(
            "command cannot be empty".to_string(),
        ));
    }

    if args.times < 1 {
        return Err(EncoreError::ConfigError(
            "--times must be at least 1".to_string(),
        ));
    }

    Ok(())
}
