// src/ui/tui/mod.rs

//! Interactive full-screen presenter.
//!
//! The presenter is split the same way the execution side is:
//!
//! - [`TuiFormatter`] is the observer half. It runs on the executor's task
//!   and translates every lifecycle call (and every live output chunk)
//!   into a [`RunEvent`] on an unbounded mpsc channel. It never touches
//!   presenter state.
//! - [`driver`] owns the terminal and the single event loop that consumes
//!   the channel alongside user input and a periodic tick. It is the only
//!   task that reads or mutates [`state::SessionState`], so rendering
//!   needs no locks.
//! - [`state`] is the pure state machine (no tokio, no terminal), and
//!   [`render`] the pure frame function over it.
//!
//! The driver releases a one-shot readiness gate once its loop is about to
//! start receiving; the orchestrator must not start the executor before
//! that, or early events would be sent to a consumer that does not exist
//! yet.

pub mod driver;
pub mod render;
pub mod state;

pub use driver::run_presenter;
pub use render::Theme;
pub use state::SessionState;

use tokio::sync::mpsc;

use crate::exec::{OutputSink, RunObserver, RunResult};

/// Which stream a chunk of live output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogOrigin {
    Stdout,
    Stderr,
}

/// Run lifecycle events flowing from the executor into the presenter.
///
/// Events from a single producer arrive in the order generated; execution
/// is strictly sequential, so run N's `Completed` always precedes run
/// N+1's `Started`.
#[derive(Debug, Clone)]
pub enum RunEvent {
    Started { run_id: u32 },
    Output { run_id: u32, origin: LogOrigin, bytes: Vec<u8> },
    Completed { result: RunResult },
    SessionFinished,
}

/// Observer half of the presenter.
pub struct TuiFormatter {
    events_tx: mpsc::UnboundedSender<RunEvent>,
    current_run: u32,
}

impl TuiFormatter {
    pub fn new(events_tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self {
            events_tx,
            current_run: 0,
        }
    }
}

impl RunObserver for TuiFormatter {
    fn on_start(&mut self, run_id: u32) {
        self.current_run = run_id;
        let _ = self.events_tx.send(RunEvent::Started { run_id });
    }

    fn on_complete(&mut self, result: &RunResult) {
        let _ = self.events_tx.send(RunEvent::Completed {
            result: result.clone(),
        });
    }

    fn on_finish(&mut self) {
        let _ = self.events_tx.send(RunEvent::SessionFinished);
    }

    fn live_sinks(&mut self) -> (Option<Box<dyn OutputSink>>, Option<Box<dyn OutputSink>>) {
        let sink = |origin| -> Option<Box<dyn OutputSink>> {
            Some(Box::new(ChannelSink {
                events_tx: self.events_tx.clone(),
                run_id: self.current_run,
                origin,
            }))
        };
        (sink(LogOrigin::Stdout), sink(LogOrigin::Stderr))
    }
}

/// Live sink that forwards chunks as events. Send failures mean the
/// presenter is gone; dropping the chunk is the correct best-effort move.
struct ChannelSink {
    events_tx: mpsc::UnboundedSender<RunEvent>,
    run_id: u32,
    origin: LogOrigin,
}

impl OutputSink for ChannelSink {
    fn accept(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        let _ = self.events_tx.send(RunEvent::Output {
            run_id: self.run_id,
            origin: self.origin,
            bytes: chunk.to_vec(),
        });
    }
}
