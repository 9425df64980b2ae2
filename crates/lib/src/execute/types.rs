//! Result and error types for build execution.
//!
//! A [`BuildResult`] is the single surface a caller inspects after a run:
//! diagnostics with severities plus a counter of builds actually performed.
//! Results merge associatively, so per-item results can be folded into an
//! aggregate in any grouping. [`RunOutcome`] is the full accounting of one
//! ordered run, including the transient failed set used to skip dependents.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ItemId;

/// Severity of a single build diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
  Warning,
  Error,
}

/// One diagnostic produced while building an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMessage {
  pub severity: Severity,

  /// Name of the item that produced the message, when known.
  pub item: Option<String>,

  pub text: String,
}

/// Aggregated outcome of building a set of items.
///
/// Counts are derived from the message list, so they can never disagree
/// with it. `build_count` tracks how many item builds were actually
/// performed; zero errors does not imply zero warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
  messages: Vec<BuildMessage>,

  /// Number of item builds performed to produce this result.
  pub build_count: usize,
}

impl BuildResult {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_error(&mut self, item: Option<&str>, text: impl Into<String>) {
    self.messages.push(BuildMessage {
      severity: Severity::Error,
      item: item.map(str::to_string),
      text: text.into(),
    });
  }

  pub fn add_warning(&mut self, item: Option<&str>, text: impl Into<String>) {
    self.messages.push(BuildMessage {
      severity: Severity::Warning,
      item: item.map(str::to_string),
      text: text.into(),
    });
  }

  pub fn messages(&self) -> &[BuildMessage] {
    &self.messages
  }

  pub fn error_count(&self) -> usize {
    self
      .messages
      .iter()
      .filter(|message| message.severity == Severity::Error)
      .count()
  }

  pub fn warning_count(&self) -> usize {
    self
      .messages
      .iter()
      .filter(|message| message.severity == Severity::Warning)
      .count()
  }

  /// Whether this result carries at least one error.
  pub fn failed(&self) -> bool {
    self.error_count() > 0
  }

  /// Merge `other` into `self`: messages concatenate, build counts add.
  pub fn append(&mut self, other: BuildResult) {
    self.messages.extend(other.messages);
    self.build_count += other.build_count;
  }
}

/// Full accounting of one ordered build run.
///
/// The failed set is transient run state used for dependent skipping; it is
/// never persisted.
#[derive(Debug, Default)]
pub struct RunOutcome {
  /// Every per-item result merged in run order.
  pub result: BuildResult,

  /// Items whose build was invoked and produced no errors, in run order.
  pub built: Vec<ItemId>,

  /// Items whose own build produced errors.
  pub failed: HashSet<ItemId>,

  /// Items never invoked because a referenced item had already failed,
  /// mapped to the culprit.
  pub skipped: HashMap<ItemId, ItemId>,

  /// True when the run stopped early on a cancellation request. The
  /// partial aggregate is still valid.
  pub cancelled: bool,
}

impl RunOutcome {
  /// The failed set dependents are skipped against: failures plus skips.
  pub fn failed_set(&self) -> HashSet<ItemId> {
    let mut set = self.failed.clone();
    set.extend(self.skipped.keys().copied());
    set
  }

  /// True when every item was invoked and none failed.
  pub fn is_success(&self) -> bool {
    !self.cancelled && self.failed.is_empty() && self.skipped.is_empty()
  }
}

/// Errors surfaced by the ordering layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecuteError {
  /// No linear build order exists: the dependency graph restricted to the
  /// requested items contains a cycle.
  #[error("cyclic dependency in build order")]
  CyclicDependency,
}
