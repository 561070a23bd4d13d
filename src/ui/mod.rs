// src/ui/mod.rs

//! Output formatters.
//!
//! Each formatter implements [`crate::exec::RunObserver`] and is selected
//! by the configured output format:
//!
//! - [`raw`] — one line per lifecycle event on stderr, live command output
//!   passed through to the real stdout/stderr.
//! - [`json`] — buffers results and emits one aggregate JSON document on
//!   stdout at session end.
//! - [`tui`] — full-screen interactive view; the observer side translates
//!   each call into an event on the presenter's channel.

pub mod json;
pub mod raw;
pub mod tui;

pub use json::JsonFormatter;
pub use raw::RawFormatter;
pub use tui::TuiFormatter;

use std::time::Duration;

/// Compact duration for human-facing output ("480ms", "2.50s", "1m05s").
pub fn human_duration(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        format!("{}ms", d.as_millis())
    } else if d < Duration::from_secs(60) {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}
