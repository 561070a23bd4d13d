// src/exec/executor.rs

//! Sequential run loop and the observer seam.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::errors::{EncoreError, Result};
use crate::exec::runner::{CommandRunner, OutputSink, RunResult};

/// Consumes run lifecycle notifications.
///
/// Implemented by the output formatters (raw, json, tui). Calls arrive in
/// strict order per session: `on_start`/`on_complete` pairs with increasing
/// run ids, then exactly one `on_finish` on every exit path.
pub trait RunObserver: Send {
    fn on_start(&mut self, run_id: u32);
    fn on_complete(&mut self, result: &RunResult);
    fn on_finish(&mut self);

    /// Fresh best-effort live sinks for the run that was just started.
    ///
    /// Called once per run, after `on_start`. `None` disables live
    /// streaming for that stream.
    fn live_sinks(&mut self) -> (Option<Box<dyn OutputSink>>, Option<Box<dyn OutputSink>>);
}

/// Trait abstracting how a session's runs are driven.
///
/// There is exactly one implementation, [`SequentialExecutor`]; the trait
/// is the seam where a different execution strategy would plug in.
pub trait Executor: Send {
    fn execute<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
        config: &'a RunConfig,
        observer: &'a mut (dyn RunObserver + 'a),
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Runs the command `times` times, one invocation at a time.
#[derive(Debug, Default)]
pub struct SequentialExecutor {
    runner: CommandRunner,
}

impl SequentialExecutor {
    pub fn new() -> Self {
        Self {
            runner: CommandRunner::new(),
        }
    }

    /// Drive run ids `1..=config.times` in strict order.
    ///
    /// A failed invocation is data (a `RunResult` with `success == false`),
    /// not a loop-terminating error; only ambient cancellation cuts the
    /// loop short, reported as [`EncoreError::Cancelled`]. `on_finish` is
    /// called exactly once on every path.
    pub async fn run_all(
        &self,
        cancel: &CancellationToken,
        config: &RunConfig,
        observer: &mut (dyn RunObserver + '_),
    ) -> Result<()> {
        info!(times = config.times, cmd = %config.command_line(), "session started");

        for run_id in 1..=config.times {
            if cancel.is_cancelled() {
                debug!(run_id, "cancelled before run could start");
                observer.on_finish();
                return Err(EncoreError::Cancelled);
            }

            observer.on_start(run_id);
            let (stdout_sink, stderr_sink) = observer.live_sinks();

            let result = self
                .runner
                .run(cancel, config, run_id, stdout_sink, stderr_sink)
                .await;

            observer.on_complete(&result);
        }

        observer.on_finish();
        Ok(())
    }
}

impl Executor for SequentialExecutor {
    fn execute<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
        config: &'a RunConfig,
        observer: &'a mut (dyn RunObserver + 'a),
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.run_all(cancel, config, observer))
    }
}

/// Select the executor for a config.
///
/// Strictly sequential execution is the only supported mode.
pub fn new_executor(_config: &RunConfig) -> SequentialExecutor {
    SequentialExecutor::new()
}
