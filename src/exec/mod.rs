// src/exec/mod.rs

//! Process execution layer.
//!
//! This module owns the subprocess lifecycle for one session, using
//! `tokio::process::Command`, and reports back to the configured observer.
//!
//! - [`capture`] provides the bounded in-memory output buffer.
//! - [`runner`] runs one invocation: spawn, stream pumping, timeout and
//!   cancellation handling, process-group teardown.
//! - [`executor`] drives the sequential run loop and defines the
//!   [`RunObserver`] seam that the output formatters implement.

pub mod capture;
pub mod executor;
pub mod runner;

pub use capture::{CAPTURE_LIMIT, CaptureBuffer};
pub use executor::{Executor, RunObserver, SequentialExecutor, new_executor};
pub use runner::{CommandRunner, FailureCause, OutputSink, RunResult};
