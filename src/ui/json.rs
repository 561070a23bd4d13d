// src/ui/json.rs

//! Structured formatter: buffers all results and emits one JSON document
//! on stdout when the session ends.

use serde::Serialize;
use tracing::error;

use crate::exec::{OutputSink, RunObserver, RunResult};

#[derive(Debug, Serialize, PartialEq)]
pub struct ResultJson {
    pub id: u32,
    pub exit_code: i32,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    results: &'a [ResultJson],
}

#[derive(Debug, Default)]
pub struct JsonFormatter {
    results: Vec<ResultJson>,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffered results, for inspection in tests.
    pub fn results(&self) -> &[ResultJson] {
        &self.results
    }
}

impl From<&RunResult> for ResultJson {
    fn from(result: &RunResult) -> Self {
        ResultJson {
            id: result.id,
            exit_code: result.exit_code,
            success: result.success,
            duration_ms: result.duration.as_millis() as u64,
            stdout: String::from_utf8_lossy(&result.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            error: result
                .failure
                .as_ref()
                .map(|cause| cause.to_string())
                .unwrap_or_default(),
        }
    }
}

impl RunObserver for JsonFormatter {
    fn on_start(&mut self, _run_id: u32) {}

    fn on_complete(&mut self, result: &RunResult) {
        self.results.push(ResultJson::from(result));
    }

    fn on_finish(&mut self) {
        let report = Report {
            results: &self.results,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(doc) => println!("{doc}"),
            Err(err) => error!(error = %err, "failed to encode JSON report"),
        }
    }

    fn live_sinks(&mut self) -> (Option<Box<dyn OutputSink>>, Option<Box<dyn OutputSink>>) {
        // Output belongs in the final document, not interleaved on the
        // terminal.
        (None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::FailureCause;
    use chrono::Local;
    use std::time::Duration;

    fn result(id: u32, exit_code: i32, failure: Option<FailureCause>) -> RunResult {
        RunResult {
            id,
            exit_code,
            stdout: b"hello\n".to_vec(),
            stderr: Vec::new(),
            success: failure.is_none(),
            started_at: Local::now(),
            finished_at: Local::now(),
            duration: Duration::from_millis(120),
            failure,
        }
    }

    #[test]
    fn buffers_results_until_finish() {
        let mut formatter = JsonFormatter::new();
        formatter.on_start(1);
        formatter.on_complete(&result(1, 0, None));
        formatter.on_complete(&result(2, 7, Some(FailureCause::Exit(7))));

        assert_eq!(formatter.results().len(), 2);
        assert_eq!(formatter.results()[0].duration_ms, 120);
        assert_eq!(formatter.results()[1].error, "exit status 7");
    }

    #[test]
    fn document_shape_matches_the_contract() {
        let json = serde_json::to_value(Report {
            results: &[ResultJson::from(&result(1, 0, None))],
        })
        .unwrap();

        let entry = &json["results"][0];
        assert_eq!(entry["id"], 1);
        assert_eq!(entry["exit_code"], 0);
        assert_eq!(entry["success"], true);
        assert_eq!(entry["stdout"], "hello\n");
        // Empty fields are omitted entirely.
        assert!(entry.get("stderr").is_none());
        assert!(entry.get("error").is_none());
    }
}
