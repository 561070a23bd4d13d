// src/ui/tui/driver.rs

//! Terminal ownership and the presenter event loop.
//!
//! A single task owns the terminal and the state; everything else talks to
//! it through the event channel. The loop multiplexes run events, keyboard
//! input, a periodic tick, and external cancellation, and redraws once per
//! iteration.

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::RunConfig;
use crate::errors::Result;

use super::render::{render_frame, Theme};
use super::state::{KeyAction, SessionState};
use super::RunEvent;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Runs the presenter until the user quits or the session is cancelled.
///
/// Sends on `ready_tx` just before entering the loop; the caller must not
/// start producing events before that fires. Cancels `cancel` on the way
/// out so an in-flight run stops when the user quits early.
pub async fn run_presenter(
    config: RunConfig,
    events_rx: mpsc::UnboundedReceiver<RunEvent>,
    ready_tx: oneshot::Sender<()>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, config, events_rx, ready_tx, cancel.clone()).await;
    ratatui::restore();
    cancel.cancel();
    result
}

async fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    config: RunConfig,
    mut events_rx: mpsc::UnboundedReceiver<RunEvent>,
    ready_tx: oneshot::Sender<()>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut state = SessionState::new(&config);
    let theme = Theme::default();
    let mut input = EventStream::new();
    let mut ticks = interval(TICK_INTERVAL);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut events_open = true;

    let _ = ready_tx.send(());
    debug!("presenter loop started");

    loop {
        terminal.draw(|frame| render_frame(frame, &state, &theme))?;

        tokio::select! {
            event = events_rx.recv(), if events_open => {
                match event {
                    Some(event) => state.apply(event),
                    // Producer gone; the screen stays up until the user quits.
                    None => events_open = false,
                }
            }
            input_event = input.next() => {
                match input_event {
                    Some(Ok(Event::Key(key))) => {
                        if is_quit(&key) {
                            debug!("quit requested");
                            break;
                        }
                        if let Some(action) = key_action(&key) {
                            state.on_key(action);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(error = %err, "terminal input error");
                        break;
                    }
                    None => break,
                }
            }
            // Ticks only matter while the elapsed display is moving.
            _ = ticks.tick(), if !state.finished => {
                state.on_tick(chrono::Local::now());
            }
            _ = cancel.cancelled() => {
                debug!("presenter cancelled");
                break;
            }
        }
    }

    Ok(())
}

fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(KeyAction::SelectPrev),
        KeyCode::Down | KeyCode::Char('j') => Some(KeyAction::SelectNext),
        KeyCode::Home | KeyCode::Char('g') => Some(KeyAction::Home),
        KeyCode::End | KeyCode::Char('G') => Some(KeyAction::End),
        KeyCode::PageUp => Some(KeyAction::PageUp),
        KeyCode::PageDown => Some(KeyAction::PageDown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_keys_are_recognized() {
        assert!(is_quit(&press(KeyCode::Char('q'))));
        assert!(is_quit(&press(KeyCode::Esc)));
        assert!(is_quit(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!is_quit(&press(KeyCode::Char('x'))));
    }

    #[test]
    fn navigation_keys_map_to_actions() {
        assert_eq!(key_action(&press(KeyCode::Up)), Some(KeyAction::SelectPrev));
        assert_eq!(key_action(&press(KeyCode::Char('j'))), Some(KeyAction::SelectNext));
        assert_eq!(key_action(&press(KeyCode::PageUp)), Some(KeyAction::PageUp));
        assert_eq!(key_action(&press(KeyCode::Char('z'))), None);
    }
}
