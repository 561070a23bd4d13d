// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod ui;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{CliArgs, OutputFormat};
use crate::config::RunConfig;
use crate::errors::{EncoreError, Result};
use crate::exec::{new_executor, RunObserver};
use crate::ui::{tui, JsonFormatter, RawFormatter, TuiFormatter};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - CLI validation into a [`RunConfig`]
/// - Ctrl-C handling via a shared cancellation token
/// - the sequential executor
/// - the selected presenter (TUI, raw, or JSON)
pub async fn run(args: CliArgs) -> Result<()> {
    let config = RunConfig::try_from(args)?;

    // Ctrl-C → cooperative cancellation. Every run shares this token.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {err}");
                return;
            }
            debug!("interrupt received");
            cancel.cancel();
        });
    }

    match config.format {
        OutputFormat::Tui => run_interactive(config, cancel).await,
        OutputFormat::Raw => {
            let mut observer = RawFormatter::new(config.verbosity);
            run_plain(&config, &cancel, &mut observer).await
        }
        OutputFormat::Json => {
            let mut observer = JsonFormatter::new();
            run_plain(&config, &cancel, &mut observer).await
        }
    }
}

async fn run_plain(
    config: &RunConfig,
    cancel: &CancellationToken,
    observer: &mut (dyn RunObserver + '_),
) -> Result<()> {
    let executor = new_executor(config);
    executor.run_all(cancel, config, observer).await
}

/// TUI mode: the presenter owns the terminal on its own task, the executor
/// feeds it events from this one.
///
/// The executor must not start before the presenter loop is receiving, so
/// we block on the readiness gate first. When the session ends normally
/// the screen stays up until the user quits; quitting early cancels the
/// shared token, which stops the in-flight run.
async fn run_interactive(config: RunConfig, cancel: CancellationToken) -> Result<()> {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (ready_tx, ready_rx) = oneshot::channel();

    let presenter = tokio::spawn(tui::run_presenter(
        config.clone(),
        events_rx,
        ready_tx,
        cancel.clone(),
    ));

    if ready_rx.await.is_err() {
        // Presenter died before entering its loop (terminal init failure).
        return presenter
            .await
            .map_err(|err| EncoreError::Other(err.into()))?;
    }

    let mut observer = TuiFormatter::new(events_tx);
    let executor = new_executor(&config);
    let session = executor.run_all(&cancel, &config, &mut observer).await;
    // Closing the channel lets the presenter notice the producer is gone
    // while it keeps the final screen up.
    drop(observer);

    let presentation = presenter
        .await
        .map_err(|err| EncoreError::Other(err.into()))?;

    match session {
        // Quitting the TUI mid-session is a clean stop, not an error.
        Err(EncoreError::Cancelled) => presentation,
        other => presentation.and(other),
    }
}
