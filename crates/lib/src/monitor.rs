//! Progress reporting and cooperative cancellation.
//!
//! The orchestration core never draws its own progress UI. Everything it has
//! to say during a collection, build, or clean pass goes through a
//! [`ProgressMonitor`] supplied by the caller, and the only way a run stops
//! early is the monitor answering `true` to [`cancel_requested`], polled once
//! per item boundary.
//!
//! [`cancel_requested`]: ProgressMonitor::cancel_requested

use tracing::{debug, error, info};

/// Progress sink consumed by build, clean, and reload operations.
///
/// All methods default to no-ops, so a monitor only implements what it cares
/// about. Cancellation defaults to "never".
pub trait ProgressMonitor {
  /// A task with a known number of steps is starting.
  fn begin_task(&mut self, label: &str, total_steps: usize) {
    let _ = (label, total_steps);
  }

  /// `steps` units of the current task finished.
  fn step(&mut self, steps: usize) {
    let _ = steps;
  }

  /// The current task is done, successfully or not.
  fn end_task(&mut self) {}

  /// A non-fatal error happened; the operation keeps going where it can.
  fn report_error(&mut self, message: &str, error: Option<&dyn std::error::Error>) {
    let _ = (message, error);
  }

  /// Whether the caller wants the current run to stop at the next item
  /// boundary. Cancellation is a normal exit path, not a failure.
  fn cancel_requested(&self) -> bool {
    false
  }
}

/// Monitor that swallows all progress and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMonitor;

impl ProgressMonitor for NullMonitor {}

/// Monitor that forwards progress to the active `tracing` subscriber.
///
/// Task boundaries log at info, steps at debug, reported errors at error.
#[derive(Debug, Default)]
pub struct LogMonitor {
  tasks: Vec<String>,
}

impl LogMonitor {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ProgressMonitor for LogMonitor {
  fn begin_task(&mut self, label: &str, total_steps: usize) {
    info!(task = label, steps = total_steps, "task started");
    self.tasks.push(label.to_string());
  }

  fn step(&mut self, steps: usize) {
    let task = self.tasks.last().map(String::as_str).unwrap_or("");
    debug!(task, steps, "progress");
  }

  fn end_task(&mut self) {
    if let Some(task) = self.tasks.pop() {
      info!(task = %task, "task finished");
    }
  }

  fn report_error(&mut self, message: &str, error: Option<&dyn std::error::Error>) {
    match error {
      Some(source) => error!(source = %source, "{message}"),
      None => error!("{message}"),
    }
  }
}
