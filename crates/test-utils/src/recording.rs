//! Recording observer for integration tests.
//!
//! Captures the full lifecycle call sequence so tests can assert ordering
//! (`on_start` before `on_complete`, `on_finish` exactly once) as well as
//! the results themselves.

use std::sync::{Arc, Mutex};

use encore::exec::{OutputSink, RunObserver, RunResult};

/// One lifecycle call, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedCall {
    Started(u32),
    Completed { id: u32, success: bool, exit_code: i32 },
    Finished,
}

/// Observer that records everything and (optionally) collects live output.
#[derive(Default)]
pub struct RecordingObserver {
    pub calls: Vec<ObservedCall>,
    pub results: Vec<RunResult>,
    capture_live: bool,
    live_stdout: Arc<Mutex<Vec<u8>>>,
    live_stderr: Arc<Mutex<Vec<u8>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also hand out live sinks, accumulating chunks across all runs.
    pub fn with_live_capture() -> Self {
        Self {
            capture_live: true,
            ..Self::default()
        }
    }

    pub fn live_stdout(&self) -> Vec<u8> {
        self.live_stdout.lock().unwrap().clone()
    }

    pub fn live_stderr(&self) -> Vec<u8> {
        self.live_stderr.lock().unwrap().clone()
    }

    pub fn started_ids(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ObservedCall::Started(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn finish_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ObservedCall::Finished))
            .count()
    }
}

impl RunObserver for RecordingObserver {
    fn on_start(&mut self, run_id: u32) {
        self.calls.push(ObservedCall::Started(run_id));
    }

    fn on_complete(&mut self, result: &RunResult) {
        self.calls.push(ObservedCall::Completed {
            id: result.id,
            success: result.success,
            exit_code: result.exit_code,
        });
        self.results.push(result.clone());
    }

    fn on_finish(&mut self) {
        self.calls.push(ObservedCall::Finished);
    }

    fn live_sinks(&mut self) -> (Option<Box<dyn OutputSink>>, Option<Box<dyn OutputSink>>) {
        if !self.capture_live {
            return (None, None);
        }
        let sink = |buf: &Arc<Mutex<Vec<u8>>>| -> Option<Box<dyn OutputSink>> {
            Some(Box::new(SharedSink {
                buf: Arc::clone(buf),
            }))
        };
        (sink(&self.live_stdout), sink(&self.live_stderr))
    }
}

struct SharedSink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl OutputSink for SharedSink {
    fn accept(&mut self, chunk: &[u8]) {
        self.buf.lock().unwrap().extend_from_slice(chunk);
    }
}
