//! Test doubles for workspace and execution tests.
//!
//! `StubEntry` is a scriptable buildable leaf that records its invocations
//! into a shared log; `RecordingMonitor` captures progress traffic and can
//! request cancellation after a fixed number of steps.

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use crate::entry::{Entry, EventCapabilities};
use crate::execute::BuildResult;
use crate::monitor::ProgressMonitor;

/// Shared call log; stubs append one line per operation.
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
  Rc::new(RefCell::new(Vec::new()))
}

/// Scriptable buildable leaf.
#[derive(Debug)]
pub struct StubEntry {
  pub label: String,
  pub references: Vec<String>,
  pub fail: bool,
  pub warnings: usize,
  pub needs_build: bool,
  pub last_built: Option<SystemTime>,
  pub capabilities: EventCapabilities,
  pub file: Option<PathBuf>,
  pub log: Option<CallLog>,
}

impl StubEntry {
  pub fn new(label: &str) -> Self {
    Self {
      label: label.to_string(),
      references: Vec::new(),
      fail: false,
      warnings: 0,
      needs_build: true,
      last_built: None,
      capabilities: EventCapabilities::ALL,
      file: None,
      log: None,
    }
  }

  pub fn with_log(mut self, log: &CallLog) -> Self {
    self.log = Some(Rc::clone(log));
    self
  }

  pub fn with_references(mut self, references: &[&str]) -> Self {
    self.references = references.iter().map(|name| name.to_string()).collect();
    self
  }

  pub fn failing(mut self) -> Self {
    self.fail = true;
    self
  }

  pub fn with_warnings(mut self, warnings: usize) -> Self {
    self.warnings = warnings;
    self
  }

  pub fn with_file(mut self, path: &str) -> Self {
    self.file = Some(PathBuf::from(path));
    self
  }

  pub fn with_last_built(mut self, time: SystemTime) -> Self {
    self.last_built = Some(time);
    self
  }

  pub fn with_capabilities(mut self, capabilities: EventCapabilities) -> Self {
    self.capabilities = capabilities;
    self
  }

  fn record(&self, line: String) {
    if let Some(log) = &self.log {
      log.borrow_mut().push(line);
    }
  }
}

impl Entry for StubEntry {
  fn needs_building(&self, _configuration: &str) -> bool {
    self.needs_build
  }

  fn referenced_items(&self, _configuration: &str) -> Vec<String> {
    self.references.clone()
  }

  fn build(&mut self, _monitor: &mut dyn ProgressMonitor, configuration: &str) -> BuildResult {
    self.record(format!("build {} [{configuration}]", self.label));
    let mut result = BuildResult::new();
    if self.fail {
      result.add_error(Some(&self.label), "build failed");
    }
    for n in 0..self.warnings {
      result.add_warning(Some(&self.label), format!("warning {n}"));
    }
    result
  }

  fn clean(&mut self, _monitor: &mut dyn ProgressMonitor, configuration: &str) {
    self.record(format!("clean {} [{configuration}]", self.label));
  }

  fn last_build_time(&self, _configuration: &str) -> Option<SystemTime> {
    self.last_built
  }

  fn save(&mut self, _monitor: &mut dyn ProgressMonitor) -> io::Result<()> {
    self.record(format!("save {}", self.label));
    Ok(())
  }

  fn capabilities(&self) -> EventCapabilities {
    self.capabilities
  }

  fn file_name(&self) -> Option<&Path> {
    self.file.as_deref()
  }
}

/// Monitor capturing progress traffic; optionally cancels after a fixed
/// number of steps.
#[derive(Debug, Default)]
pub struct RecordingMonitor {
  pub tasks: Vec<(String, usize)>,
  pub steps: usize,
  pub ended: usize,
  pub errors: Vec<String>,
  pub cancel_after: Option<usize>,
}

impl RecordingMonitor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancelling_after(steps: usize) -> Self {
    Self {
      cancel_after: Some(steps),
      ..Self::default()
    }
  }
}

impl ProgressMonitor for RecordingMonitor {
  fn begin_task(&mut self, label: &str, total_steps: usize) {
    self.tasks.push((label.to_string(), total_steps));
  }

  fn step(&mut self, steps: usize) {
    self.steps += steps;
  }

  fn end_task(&mut self) {
    self.ended += 1;
  }

  fn report_error(&mut self, message: &str, _error: Option<&dyn std::error::Error>) {
    self.errors.push(message.to_string());
  }

  fn cancel_requested(&self) -> bool {
    self.cancel_after.is_some_and(|limit| self.steps >= limit)
  }
}
