// src/ui/tui/render.rs

//! Pure frame rendering over [`SessionState`].
//!
//! Layout: a run list sidebar on the left, a detail pane (command, status,
//! log window) on the right, and a one-line footer with totals and the key
//! legend. Everything here is a function of the state snapshot, which is
//! what makes the `TestBackend` tests deterministic.

use chrono::{DateTime, Local};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::ui::human_duration;

use super::state::{RunState, RunStatus, SessionState};
use super::LogOrigin;

const SIDEBAR_WIDTH: u16 = 24;

/// Colors and accents in one place.
pub struct Theme {
    pub success: Style,
    pub failure: Style,
    pub running: Style,
    pub pending: Style,
    pub stderr: Style,
    pub accent: Style,
    pub dim: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: Style::default().fg(Color::Green),
            failure: Style::default().fg(Color::Red),
            running: Style::default().fg(Color::Yellow),
            pending: Style::default().fg(Color::DarkGray),
            stderr: Style::default().fg(Color::LightRed),
            accent: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::DarkGray),
        }
    }
}

pub fn render_frame(frame: &mut Frame, state: &SessionState, theme: &Theme) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(outer[0]);

    render_run_list(frame, panes[0], state, theme);
    render_detail(frame, panes[1], state, theme);
    render_footer(frame, outer[1], state, theme);
}

fn status_icon(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pending => "·",
        RunStatus::Running => "⟳",
        RunStatus::Succeeded => "✓",
        RunStatus::Failed => "✗",
    }
}

fn status_style(status: RunStatus, theme: &Theme) -> Style {
    match status {
        RunStatus::Pending => theme.pending,
        RunStatus::Running => theme.running,
        RunStatus::Succeeded => theme.success,
        RunStatus::Failed => theme.failure,
    }
}

fn render_run_list(frame: &mut Frame, area: Rect, state: &SessionState, theme: &Theme) {
    let items: Vec<ListItem> = state
        .runs
        .iter()
        .map(|run| {
            let style = status_style(run.status, theme);
            let mut label = format!("{} {:<4}", status_icon(run.status), run.id);
            if let Some(start) = run.started_at {
                label.push_str(&start.format("%H:%M:%S").to_string());
            }
            if run.status == RunStatus::Failed {
                if let Some(code) = run.exit_code {
                    label.push_str(&format!(" !{code}"));
                }
            }
            ListItem::new(Line::from(Span::styled(label, style)))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("runs"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_detail(frame: &mut Frame, area: Rect, state: &SessionState, theme: &Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(1)])
        .split(area);

    let header = match state.selected_run() {
        Some(run) => detail_header(run, state, theme),
        None => vec![Line::from("no runs")],
    };
    frame.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("run")),
        rows[0],
    );

    render_log_window(frame, rows[1], state, theme);
}

fn detail_header<'a>(run: &'a RunState, state: &'a SessionState, theme: &'a Theme) -> Vec<Line<'a>> {
    let status_line = match run.status {
        RunStatus::Pending => Line::from(Span::styled("pending", theme.pending)),
        RunStatus::Running => Line::from(vec![
            Span::styled("running ", theme.running),
            Span::styled(elapsed_for(run, state.now), theme.dim),
        ]),
        RunStatus::Succeeded => Line::from(vec![
            Span::styled("succeeded", theme.success),
            Span::styled(
                format!(" in {}", run.duration.map(human_duration).unwrap_or_default()),
                theme.dim,
            ),
        ]),
        RunStatus::Failed => {
            let cause = run
                .failure
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "failed".to_string());
            Line::from(vec![
                Span::styled(format!("failed: {cause}"), theme.failure),
                Span::styled(
                    format!(" after {}", run.duration.map(human_duration).unwrap_or_default()),
                    theme.dim,
                ),
            ])
        }
    };
    vec![
        Line::from(vec![
            Span::styled("$ ", theme.accent),
            Span::raw(state.command_line.as_str()),
        ]),
        status_line,
    ]
}

fn elapsed_for(run: &RunState, now: DateTime<Local>) -> String {
    match run.started_at {
        Some(start) => {
            let elapsed = (now - start).to_std().unwrap_or_default();
            human_duration(elapsed)
        }
        None => String::new(),
    }
}

fn render_log_window(frame: &mut Frame, area: Rect, state: &SessionState, theme: &Theme) {
    let block = Block::default().borders(Borders::ALL).title("output");
    let inner_height = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = match state.selected_run() {
        Some(run) => {
            let logs = state.logs_for(run.id);
            let max_off = logs.len().saturating_sub(inner_height);
            // Offsets are distance from the bottom; zero follows the tail.
            let top = max_off.saturating_sub(state.log_scroll.min(max_off));
            logs.iter()
                .skip(top)
                .take(inner_height)
                .map(|line| match line.origin {
                    LogOrigin::Stdout => Line::from(Span::raw(line.text.as_str())),
                    LogOrigin::Stderr => Line::from(Span::styled(line.text.as_str(), theme.stderr)),
                })
                .collect()
        }
        None => Vec::new(),
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &SessionState, theme: &Theme) {
    let status = if state.finished {
        let failed = state.failed_count();
        if failed == 0 {
            Span::styled("all passed", theme.success)
        } else {
            Span::styled(format!("{failed} failed"), theme.failure)
        }
    } else {
        Span::styled("running", theme.running)
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" {}/{} ", state.completed_count(), state.runs.len()),
            theme.accent,
        ),
        status,
        Span::styled("  ↑/↓ select · PgUp/PgDn scroll · q quit", theme.dim),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{OutputFormat, Verbosity};
    use crate::config::RunConfig;
    use crate::ui::tui::RunEvent;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn state(times: u32) -> SessionState {
        SessionState::new(&RunConfig {
            command: vec!["echo".into(), "hi".into()],
            times,
            verbosity: Verbosity::Normal,
            format: OutputFormat::Tui,
            timeout: None,
        })
    }

    fn draw(state: &SessionState) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let theme = Theme::default();
        terminal.draw(|frame| render_frame(frame, state, &theme)).unwrap();
        terminal
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn frame_shows_command_runs_and_legend() {
        let mut s = state(3);
        s.apply(RunEvent::Started { run_id: 1 });
        let text = buffer_text(&draw(&s));

        assert!(text.contains("echo hi"));
        assert!(text.contains("⟳ 1"));
        assert!(text.contains("· 3"));
        assert!(text.contains("q quit"));
        assert!(text.contains("0/3"));
    }

    #[test]
    fn finished_session_reports_failures_in_footer() {
        let mut s = state(1);
        s.apply(RunEvent::Started { run_id: 1 });
        s.apply(RunEvent::Completed {
            result: crate::exec::RunResult {
                id: 1,
                exit_code: 2,
                stdout: Vec::new(),
                stderr: Vec::new(),
                success: false,
                started_at: Local::now(),
                finished_at: Local::now(),
                duration: std::time::Duration::from_millis(30),
                failure: Some(crate::exec::FailureCause::Exit(2)),
            },
        });
        s.apply(RunEvent::SessionFinished);

        let text = buffer_text(&draw(&s));
        assert!(text.contains("1 failed"));
        assert!(text.contains("exit status 2"));
        assert!(text.contains("1/1"));
    }

    #[test]
    fn rendering_is_idempotent_for_a_fixed_state() {
        let mut s = state(2);
        s.apply(RunEvent::Started { run_id: 1 });
        s.apply(RunEvent::Output {
            run_id: 1,
            origin: super::super::LogOrigin::Stdout,
            bytes: b"hello\n".to_vec(),
        });

        let first = buffer_text(&draw(&s));
        let second = buffer_text(&draw(&s));
        assert_eq!(first, second);
        assert!(first.contains("hello"));
    }
}
