// tests/executor_sequencing.rs

//! End-to-end sequencing of the executor against real child processes.

use std::error::Error;

use tokio_util::sync::CancellationToken;

use encore::cli::{OutputFormat, Verbosity};
use encore::config::RunConfig;
use encore::exec::SequentialExecutor;
use encore_test_utils::recording::{ObservedCall, RecordingObserver};
use encore_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn config(command: Vec<&str>, times: u32) -> RunConfig {
    RunConfig {
        command: command.into_iter().map(String::from).collect(),
        times,
        verbosity: Verbosity::Normal,
        format: OutputFormat::Raw,
        timeout: None,
    }
}

#[tokio::test]
async fn runs_execute_in_order_with_one_finish() -> TestResult {
    init_tracing();
    let executor = SequentialExecutor::new();
    let cancel = CancellationToken::new();
    let cfg = config(vec!["true"], 3);
    let mut observer = RecordingObserver::new();

    with_timeout(executor.run_all(&cancel, &cfg, &mut observer)).await?;

    assert_eq!(observer.started_ids(), vec![1, 2, 3]);
    assert_eq!(observer.finish_count(), 1);
    // Every start is directly followed by its completion.
    for pair in observer.calls.chunks(2).take(3) {
        match pair {
            [ObservedCall::Started(s), ObservedCall::Completed { id, .. }] => {
                assert_eq!(s, id);
            }
            other => panic!("unexpected call pair: {other:?}"),
        }
    }
    Ok(())
}

#[tokio::test]
async fn failing_runs_do_not_stop_the_session() -> TestResult {
    init_tracing();
    let executor = SequentialExecutor::new();
    let cancel = CancellationToken::new();
    let cfg = config(vec!["false"], 3);
    let mut observer = RecordingObserver::new();

    with_timeout(executor.run_all(&cancel, &cfg, &mut observer)).await?;

    assert_eq!(observer.results.len(), 3);
    for result in &observer.results {
        assert!(!result.success);
        assert_ne!(result.exit_code, 0);
    }
    assert_eq!(observer.finish_count(), 1);
    Ok(())
}

#[tokio::test]
async fn captured_and_live_output_agree() -> TestResult {
    init_tracing();
    let executor = SequentialExecutor::new();
    let cancel = CancellationToken::new();
    let cfg = config(vec!["echo", "hello"], 2);
    let mut observer = RecordingObserver::with_live_capture();

    with_timeout(executor.run_all(&cancel, &cfg, &mut observer)).await?;

    for result in &observer.results {
        assert_eq!(result.stdout, b"hello\n");
        assert!(result.stderr.is_empty());
    }
    // Live sinks saw both runs' chunks in order.
    assert_eq!(observer.live_stdout(), b"hello\nhello\n");
    Ok(())
}

#[tokio::test]
async fn single_token_commands_go_through_the_shell() -> TestResult {
    init_tracing();
    let executor = SequentialExecutor::new();
    let cancel = CancellationToken::new();
    let cfg = config(vec!["echo one && echo two"], 1);
    let mut observer = RecordingObserver::new();

    with_timeout(executor.run_all(&cancel, &cfg, &mut observer)).await?;

    assert_eq!(observer.results[0].stdout, b"one\ntwo\n");
    assert!(observer.results[0].success);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn multi_token_commands_execute_directly_with_literal_args() -> TestResult {
    use std::os::unix::fs::PermissionsExt;

    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("echo-args.sh");
    std::fs::write(&script, "#!/bin/sh\nprintf '%s|' \"$@\"\n")?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

    let executor = SequentialExecutor::new();
    let cancel = CancellationToken::new();
    // "$HOME" must arrive unexpanded: no shell in between.
    let cfg = config(vec![script.to_str().unwrap(), "$HOME", "two words"], 1);
    let mut observer = RecordingObserver::new();

    with_timeout(executor.run_all(&cancel, &cfg, &mut observer)).await?;

    assert_eq!(observer.results[0].stdout, b"$HOME|two words|");
    assert!(observer.results[0].success);
    Ok(())
}

#[tokio::test]
async fn spawn_failure_is_reported_as_a_failed_run() -> TestResult {
    init_tracing();
    let executor = SequentialExecutor::new();
    let cancel = CancellationToken::new();
    let cfg = config(vec!["/definitely/not/a/binary", "arg"], 2);
    let mut observer = RecordingObserver::new();

    // Unspawnable commands still complete the whole session.
    with_timeout(executor.run_all(&cancel, &cfg, &mut observer)).await?;

    assert_eq!(observer.results.len(), 2);
    for result in &observer.results {
        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
    }
    Ok(())
}
