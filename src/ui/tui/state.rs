// src/ui/tui/state.rs

//! Pure presenter state machine.
//!
//! No terminal, no async. The driver feeds it [`RunEvent`]s, key actions,
//! and clock ticks; the renderer reads it. Keeping it pure makes every
//! scrolling and classification rule unit-testable without a terminal.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::config::RunConfig;
use crate::exec::FailureCause;

use super::{LogOrigin, RunEvent};

/// Per-run cap on retained log lines. Beyond this the oldest lines are
/// dropped; the full output still lives in the run's capture buffers.
pub const LOG_CAP_PER_RUN: usize = 1000;

/// Lines per PageUp/PageDown step.
const SCROLL_PAGE: usize = 10;

/// Lifecycle of one run as the presenter sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RunState {
    pub id: u32,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Local>>,
    pub duration: Option<Duration>,
    pub exit_code: Option<i32>,
    pub failure: Option<FailureCause>,
}

impl RunState {
    fn pending(id: u32) -> Self {
        Self {
            id,
            status: RunStatus::Pending,
            started_at: None,
            duration: None,
            exit_code: None,
            failure: None,
        }
    }
}

/// One retained log line with its stream of origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub at: DateTime<Local>,
    pub origin: LogOrigin,
    pub text: String,
}

/// Keyboard intents the driver translates raw key events into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    SelectPrev,
    SelectNext,
    Home,
    End,
    PageUp,
    PageDown,
}

/// Presenter state for one session.
pub struct SessionState {
    pub command_line: String,
    pub runs: Vec<RunState>,
    pub selected: usize,
    pub finished: bool,
    /// Wall clock refreshed on each tick; freezes when the session ends
    /// so the elapsed column stops moving.
    pub now: DateTime<Local>,
    /// Scroll offset measured as distance from the bottom of the log.
    /// Zero means pinned to the newest line.
    pub log_scroll: usize,
    pub auto_scroll: bool,
    logs: HashMap<u32, VecDeque<LogLine>>,
    /// Partial trailing line per run and stream, completed by the next
    /// chunk that carries a newline.
    partial: HashMap<(u32, LogOrigin), String>,
}

impl SessionState {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            command_line: config.command_line(),
            runs: (1..=config.times).map(RunState::pending).collect(),
            selected: 0,
            finished: false,
            now: Local::now(),
            log_scroll: 0,
            auto_scroll: true,
            logs: HashMap::new(),
            partial: HashMap::new(),
        }
    }

    /// Retained log lines for a run, oldest first.
    pub fn logs_for(&self, run_id: u32) -> &[LogLine] {
        static EMPTY: &[LogLine] = &[];
        match self.logs.get(&run_id) {
            Some(lines) => lines.as_slices().0,
            None => EMPTY,
        }
    }

    pub fn log_len(&self, run_id: u32) -> usize {
        self.logs.get(&run_id).map_or(0, VecDeque::len)
    }

    pub fn selected_run(&self) -> Option<&RunState> {
        self.runs.get(self.selected)
    }

    pub fn completed_count(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| matches!(r.status, RunStatus::Succeeded | RunStatus::Failed))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.status == RunStatus::Failed)
            .count()
    }

    pub fn apply(&mut self, event: RunEvent) {
        match event {
            RunEvent::Started { run_id } => {
                if let Some(run) = self.run_mut(run_id) {
                    run.status = RunStatus::Running;
                    run.started_at = Some(Local::now());
                }
                // Follow the active run unless the user navigated away.
                if self.auto_scroll {
                    if let Some(idx) = self.runs.iter().position(|r| r.id == run_id) {
                        self.selected = idx;
                    }
                }
            }
            RunEvent::Output { run_id, origin, bytes } => {
                if self.run_mut(run_id).is_some() {
                    self.append_output(run_id, origin, &bytes);
                }
            }
            RunEvent::Completed { result } => {
                if let Some(run) = self.run_mut(result.id) {
                    run.status = if result.success {
                        RunStatus::Succeeded
                    } else {
                        RunStatus::Failed
                    };
                    run.started_at = Some(result.started_at);
                    run.duration = Some(result.duration);
                    run.exit_code = Some(result.exit_code);
                    run.failure = result.failure;
                }
                self.flush_partial(result.id);
            }
            RunEvent::SessionFinished => {
                self.finished = true;
            }
        }
    }

    pub fn on_key(&mut self, action: KeyAction) {
        match action {
            KeyAction::SelectPrev => {
                self.selected = self.selected.saturating_sub(1);
                self.reset_scroll();
            }
            KeyAction::SelectNext => {
                if self.selected + 1 < self.runs.len() {
                    self.selected += 1;
                }
                self.reset_scroll();
            }
            KeyAction::Home => {
                let len = self
                    .selected_run()
                    .map_or(0, |r| self.log_len(r.id));
                self.log_scroll = len;
                self.auto_scroll = false;
            }
            KeyAction::End => {
                self.log_scroll = 0;
                self.auto_scroll = true;
            }
            KeyAction::PageUp => {
                let len = self
                    .selected_run()
                    .map_or(0, |r| self.log_len(r.id));
                self.log_scroll = (self.log_scroll + SCROLL_PAGE).min(len);
                self.auto_scroll = false;
            }
            // Paging always leaves auto-follow off; only End re-arms it.
            KeyAction::PageDown => {
                self.log_scroll = self.log_scroll.saturating_sub(SCROLL_PAGE);
                self.auto_scroll = false;
            }
        }
    }

    pub fn on_tick(&mut self, now: DateTime<Local>) {
        if !self.finished {
            self.now = now;
        }
    }

    fn reset_scroll(&mut self) {
        self.log_scroll = 0;
        self.auto_scroll = true;
    }

    fn run_mut(&mut self, run_id: u32) -> Option<&mut RunState> {
        // Unknown ids are ignored rather than trusted.
        self.runs.iter_mut().find(|r| r.id == run_id)
    }

    fn append_output(&mut self, run_id: u32, origin: LogOrigin, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let key = (run_id, origin);
        let mut pending = self.partial.remove(&key).unwrap_or_default();
        pending.push_str(&text);

        let mut fragments: Vec<&str> = pending.split('\n').collect();
        // The last fragment has no newline yet; keep it pending.
        let tail = fragments.pop().unwrap_or_default().to_string();
        for fragment in fragments {
            let line = fragment.strip_suffix('\r').unwrap_or(fragment);
            if !line.is_empty() {
                self.push_line(run_id, origin, line.to_string());
            }
        }
        if !tail.is_empty() {
            self.partial.insert(key, tail);
        }
    }

    fn flush_partial(&mut self, run_id: u32) {
        for origin in [LogOrigin::Stdout, LogOrigin::Stderr] {
            if let Some(tail) = self.partial.remove(&(run_id, origin)) {
                if !tail.is_empty() {
                    self.push_line(run_id, origin, tail);
                }
            }
        }
    }

    fn push_line(&mut self, run_id: u32, origin: LogOrigin, text: String) {
        let lines = self.logs.entry(run_id).or_default();
        if lines.len() >= LOG_CAP_PER_RUN {
            lines.pop_front();
        }
        lines.push_back(LogLine {
            at: Local::now(),
            origin,
            text,
        });
        // Keeps `logs_for` a single slice.
        lines.make_contiguous();
    }
}
