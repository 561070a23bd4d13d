// src/exec/runner.rs

//! Single-invocation process runner.

use std::fmt;
use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::exec::capture::{CAPTURE_LIMIT, CaptureBuffer};

/// Grace period for draining stdout/stderr after the process exits or is
/// killed. Pipes normally close immediately after process death; if they
/// don't, we must not hang the run loop forever.
const IO_GRACE: Duration = Duration::from_secs(5);

/// Best-effort receiver for live output bytes.
///
/// Sinks get the same bytes as the capture buffer, chunk by chunk, while
/// the run is in flight. A sink's own failures never fail the run.
pub trait OutputSink: Send {
    fn accept(&mut self, chunk: &[u8]);
}

/// Why a run did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The subprocess could not be started at all.
    Spawn(String),
    /// The subprocess exited with a non-zero status (or died to a signal,
    /// reported as -1).
    Exit(i32),
    /// The ambient context was cancelled while the run was in flight.
    Cancelled,
    /// The configured per-run timeout elapsed first.
    TimedOut(Duration),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Spawn(err) => write!(f, "{err}"),
            FailureCause::Exit(code) => write!(f, "exit status {code}"),
            FailureCause::Cancelled => write!(f, "cancelled"),
            FailureCause::TimedOut(limit) => write!(f, "timeout: exceeded {limit:?}"),
        }
    }
}

/// Outcome of a single invocation. Created exactly once per run, all
/// timing fields always populated.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// 1-based sequence number, unique within a session.
    pub id: u32,
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub duration: Duration,
    pub failure: Option<FailureCause>,
}

/// How the process wait terminated.
enum ProcessOutcome {
    Completed(std::process::ExitStatus),
    WaitFailed(io::Error),
    Cancelled,
    TimedOut(Duration),
}

/// Runs one command invocation and produces a [`RunResult`].
#[derive(Debug, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run the configured command once.
    ///
    /// stdout/stderr are captured (bounded) and duplicated into the live
    /// sinks when provided. On ambient cancellation or timeout the whole
    /// process group is killed and the result is classified accordingly;
    /// the exit notification is still awaited so nothing leaks.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        config: &RunConfig,
        run_id: u32,
        stdout_sink: Option<Box<dyn OutputSink>>,
        stderr_sink: Option<Box<dyn OutputSink>>,
    ) -> RunResult {
        let started_at = Local::now();
        let started = Instant::now();

        let mut cmd = build_command(&config.command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so the entire tree the command spawns can be
        // killed as one unit.
        #[cfg(unix)]
        cmd.process_group(0);

        debug!(run_id, cmd = %config.command_line(), "spawning run process");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(run_id, error = %err, "failed to start command");
                return finish(
                    run_id,
                    started_at,
                    started,
                    -1,
                    Vec::new(),
                    Vec::new(),
                    Some(FailureCause::Spawn(err.to_string())),
                );
            }
        };

        let stdout_task = child
            .stdout
            .take()
            .map(|out| tokio::spawn(pump_stream(out, CAPTURE_LIMIT, stdout_sink)));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(pump_stream(err, CAPTURE_LIMIT, stderr_sink)));

        let run_timeout = async {
            match config.timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };

        let outcome = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => ProcessOutcome::Completed(status),
                Err(err) => ProcessOutcome::WaitFailed(err),
            },
            () = cancel.cancelled() => {
                info!(run_id, "cancellation requested; killing process group");
                kill_tree(&mut child, run_id).await;
                let _ = child.wait().await;
                ProcessOutcome::Cancelled
            }
            () = run_timeout => {
                let limit = config.timeout.unwrap_or_default();
                warn!(run_id, timeout = ?limit, "run timed out; killing process group");
                kill_tree(&mut child, run_id).await;
                let _ = child.wait().await;
                ProcessOutcome::TimedOut(limit)
            }
        };

        let stdout = collect_capture(stdout_task, run_id, "stdout").await;
        let stderr = collect_capture(stderr_task, run_id, "stderr").await;

        let (exit_code, failure) = match outcome {
            ProcessOutcome::Completed(status) => {
                let code = status.code().unwrap_or(-1);
                if status.success() {
                    (0, None)
                } else {
                    (code, Some(FailureCause::Exit(code)))
                }
            }
            ProcessOutcome::WaitFailed(err) => {
                (-1, Some(FailureCause::Spawn(err.to_string())))
            }
            ProcessOutcome::Cancelled => (-1, Some(FailureCause::Cancelled)),
            ProcessOutcome::TimedOut(limit) => (-1, Some(FailureCause::TimedOut(limit))),
        };

        let result = finish(run_id, started_at, started, exit_code, stdout, stderr, failure);

        info!(
            run_id,
            exit_code = result.exit_code,
            success = result.success,
            duration_ms = result.duration.as_millis() as u64,
            "run finished"
        );

        result
    }
}

/// Build the subprocess invocation.
///
/// A single token goes through the platform shell so pipes and globs work;
/// multiple tokens are executed directly with literal arguments.
fn build_command(tokens: &[String]) -> Command {
    if tokens.len() == 1 {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&tokens[0]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(&tokens[0]);
            cmd
        }
    } else {
        let mut cmd = Command::new(&tokens[0]);
        cmd.args(&tokens[1..]);
        cmd
    }
}

fn finish(
    run_id: u32,
    started_at: DateTime<Local>,
    started: Instant,
    exit_code: i32,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    failure: Option<FailureCause>,
) -> RunResult {
    RunResult {
        id: run_id,
        exit_code,
        stdout,
        stderr,
        success: failure.is_none(),
        started_at,
        finished_at: Local::now(),
        duration: started.elapsed(),
        failure,
    }
}

/// Kill the child's whole process group (unix), falling back to killing
/// just the child.
async fn kill_tree(child: &mut Child, run_id: u32) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // The child was spawned as its own process group leader, so its
        // pid doubles as the pgid.
        // SAFETY: killpg with a valid pgid and signal has no memory-safety
        // preconditions.
        let rc = unsafe { libc::killpg(pid as i32, libc::SIGKILL) };
        if rc == 0 {
            return;
        }
        debug!(run_id, pid, "killpg failed; falling back to Child::kill");
    }

    if let Err(err) = child.kill().await {
        warn!(run_id, error = %err, "failed to kill child process");
    }
}

/// Copy a stream into a bounded capture buffer, duplicating each chunk
/// into the live sink when one is attached.
async fn pump_stream<R>(
    mut reader: R,
    limit: usize,
    mut sink: Option<Box<dyn OutputSink>>,
) -> io::Result<CaptureBuffer>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut capture = CaptureBuffer::new(limit);
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        capture.write(&chunk[..n]);
        if let Some(sink) = sink.as_mut() {
            sink.accept(&chunk[..n]);
        }
    }

    Ok(capture)
}

/// Join a pump task, bounded by the IO grace period.
async fn collect_capture(
    task: Option<JoinHandle<io::Result<CaptureBuffer>>>,
    run_id: u32,
    stream: &'static str,
) -> Vec<u8> {
    let Some(task) = task else {
        return Vec::new();
    };

    match timeout(IO_GRACE, task).await {
        Ok(Ok(Ok(capture))) => capture.into_bytes(),
        Ok(Ok(Err(err))) => {
            warn!(run_id, stream, error = %err, "output capture failed");
            Vec::new()
        }
        Ok(Err(err)) => {
            warn!(run_id, stream, error = %err, "output pump task panicked");
            Vec::new()
        }
        Err(_) => {
            warn!(run_id, stream, "output capture timed out");
            Vec::new()
        }
    }
}
