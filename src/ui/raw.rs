// src/ui/raw.rs

//! Plain-text formatter: one line per lifecycle event on stderr.
//!
//! Command output is passed through live to the real stdout/stderr, so the
//! tool composes with pipes the way the bare command would. Lifecycle
//! lines go to stderr to keep stdout clean.

use std::io::Write;

use crate::cli::Verbosity;
use crate::exec::capture::TRUNCATION_NOTICE;
use crate::exec::{OutputSink, RunObserver, RunResult};
use crate::ui::human_duration;

pub struct RawFormatter {
    verbosity: Verbosity,
}

impl RawFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl RunObserver for RawFormatter {
    fn on_start(&mut self, run_id: u32) {
        if self.verbosity != Verbosity::Silent {
            eprintln!("[ run {run_id} ]");
        }
    }

    fn on_complete(&mut self, result: &RunResult) {
        if self.verbosity == Verbosity::Silent {
            return;
        }

        let mut line = format!(
            "[ run {} completed in {}",
            result.id,
            human_duration(result.duration)
        );

        if result.success {
            line.push_str(" - SUCCESS");
        } else {
            line.push_str(&format!(" - FAILED: exit code {}", result.exit_code));
            if let Some(cause) = &result.failure {
                line.push_str(&format!(", {cause}"));
            }
        }
        line.push_str(" ]");
        eprintln!("{line}");

        if self.verbosity == Verbosity::Verbose {
            for (stream, bytes) in [("stdout", &result.stdout), ("stderr", &result.stderr)] {
                if bytes.ends_with(TRUNCATION_NOTICE) {
                    eprintln!("[ run {}: {stream} was truncated ]", result.id);
                }
            }
        }
    }

    fn on_finish(&mut self) {}

    fn live_sinks(&mut self) -> (Option<Box<dyn OutputSink>>, Option<Box<dyn OutputSink>>) {
        if self.verbosity == Verbosity::Silent {
            return (None, None);
        }
        (
            Some(Box::new(StdStreamSink::Stdout)),
            Some(Box::new(StdStreamSink::Stderr)),
        )
    }
}

/// Passes chunks straight through to the process's own streams.
/// Write errors are swallowed; the sink is best-effort by contract.
enum StdStreamSink {
    Stdout,
    Stderr,
}

impl OutputSink for StdStreamSink {
    fn accept(&mut self, chunk: &[u8]) {
        let result = match self {
            StdStreamSink::Stdout => {
                let mut out = std::io::stdout();
                out.write_all(chunk).and_then(|()| out.flush())
            }
            StdStreamSink::Stderr => {
                let mut err = std::io::stderr();
                err.write_all(chunk).and_then(|()| err.flush())
            }
        };
        if let Err(err) = result {
            tracing::debug!(error = %err, "live passthrough write failed");
        }
    }
}
