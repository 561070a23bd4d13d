// tests/tui_event_flow.rs

//! The TUI's observer half and state machine, fed by the real executor.
//!
//! No terminal involved: the formatter writes to the channel, the state
//! machine consumes the drained events, and we assert on the resulting
//! presenter state.

use std::error::Error;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use encore::cli::{OutputFormat, Verbosity};
use encore::config::RunConfig;
use encore::exec::SequentialExecutor;
use encore::ui::tui::state::RunStatus;
use encore::ui::tui::{RunEvent, SessionState, TuiFormatter};
use encore_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn config(command: Vec<&str>, times: u32) -> RunConfig {
    RunConfig {
        command: command.into_iter().map(String::from).collect(),
        times,
        verbosity: Verbosity::Normal,
        format: OutputFormat::Tui,
        timeout: None,
    }
}

async fn run_session(cfg: &RunConfig) -> Vec<RunEvent> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let executor = SequentialExecutor::new();
    let cancel = CancellationToken::new();
    let mut observer = TuiFormatter::new(events_tx);

    with_timeout(executor.run_all(&cancel, cfg, &mut observer))
        .await
        .expect("session should finish");
    drop(observer);

    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn a_full_session_drives_the_state_to_finished() -> TestResult {
    init_tracing();
    let cfg = config(vec!["echo", "hello"], 3);
    let events = run_session(&cfg).await;

    let mut state = SessionState::new(&cfg);
    for event in events {
        state.apply(event);
    }

    assert!(state.finished);
    assert_eq!(state.completed_count(), 3);
    assert_eq!(state.failed_count(), 0);
    for run in &state.runs {
        assert_eq!(run.status, RunStatus::Succeeded);
        assert_eq!(run.exit_code, Some(0));
        // Live output reached the per-run log.
        assert_eq!(state.logs_for(run.id).len(), 1);
        assert_eq!(state.logs_for(run.id)[0].text, "hello");
    }
    Ok(())
}

#[tokio::test]
async fn failures_surface_with_their_exit_codes() -> TestResult {
    init_tracing();
    let cfg = config(vec!["sh", "-c", "echo doomed >&2; exit 7"], 2);
    let events = run_session(&cfg).await;

    let mut state = SessionState::new(&cfg);
    for event in events {
        state.apply(event);
    }

    assert!(state.finished);
    assert_eq!(state.failed_count(), 2);
    for run in &state.runs {
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.exit_code, Some(7));
        assert_eq!(state.logs_for(run.id)[0].text, "doomed");
    }
    Ok(())
}
