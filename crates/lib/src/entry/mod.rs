//! The buildable leaf abstraction.
//!
//! An [`Entry`] is the unit of real work in a workspace tree: something a
//! compiler driver, a copy step, or any external tool knows how to build.
//! The orchestration core never looks inside an entry; it sequences,
//! aggregates results, and relays notifications. Entries are created
//! outside this crate and handed over boxed; the tree owns them from then
//! on.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::execute::BuildResult;
use crate::monitor::ProgressMonitor;

/// Error produced by an [`EntryLoader`]. The text ends up verbatim on the
/// placeholder item that stands in for the unloadable entry.
pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// Notification categories an item can emit.
///
/// A folder wires exactly one relay per child and records the child's
/// capability set with it; notifications of an undeclared category are not
/// relayed. This replaces checks on concrete item types during event
/// wiring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCapabilities {
  pub file_events: bool,
  pub reference_events: bool,
  pub save_events: bool,
}

impl EventCapabilities {
  /// The container superset: folders relay everything their subtree emits.
  pub const ALL: Self = Self {
    file_events: true,
    reference_events: true,
    save_events: true,
  };

  /// No optional categories. Structural and modified notifications are
  /// always available.
  pub const NONE: Self = Self {
    file_events: false,
    reference_events: false,
    save_events: false,
  };
}

/// A buildable leaf item.
///
/// All operations take an already-mapped, item-local configuration name;
/// the workspace configuration table does the mapping before the call.
pub trait Entry: fmt::Debug {
  /// Whether a build of `configuration` would do any work.
  fn needs_building(&self, configuration: &str) -> bool;

  /// Names of the items this entry depends on under `configuration`.
  ///
  /// Resolved against the workspace at collection time; names that do not
  /// match any loaded item are ignored, since references may point outside
  /// the loaded tree.
  fn referenced_items(&self, configuration: &str) -> Vec<String> {
    let _ = configuration;
    Vec::new()
  }

  /// Build the entry, reporting through `monitor`.
  fn build(&mut self, monitor: &mut dyn ProgressMonitor, configuration: &str) -> BuildResult;

  /// Remove build outputs for `configuration`.
  fn clean(&mut self, monitor: &mut dyn ProgressMonitor, configuration: &str);

  /// When the entry was last built under `configuration`, `None` if never.
  fn last_build_time(&self, configuration: &str) -> Option<SystemTime>;

  /// Persist the entry. Successful saves are announced tree-wide.
  fn save(&mut self, monitor: &mut dyn ProgressMonitor) -> io::Result<()> {
    let _ = monitor;
    Ok(())
  }

  /// Which notification categories this entry emits.
  fn capabilities(&self) -> EventCapabilities {
    EventCapabilities::NONE
  }

  /// The file backing this entry, if any. Reload reads from it.
  fn file_name(&self) -> Option<&Path> {
    None
  }

  /// Present on placeholders standing in for entries that failed to load.
  fn load_error(&self) -> Option<&str> {
    None
  }
}

/// Reads entries from their backing files.
///
/// External collaborator used by
/// [`Workspace::reload_entry`](crate::tree::Workspace::reload_entry); the
/// core knows nothing about file formats.
pub trait EntryLoader {
  /// Load the entry at `path`, returning its name and the entry itself.
  fn load(&self, monitor: &mut dyn ProgressMonitor, path: &Path) -> Result<(String, Box<dyn Entry>), LoadError>;
}

/// Placeholder for an entry whose backing file could not be loaded.
///
/// Keeps the tree structurally consistent and iterable after a failed
/// reload; carries the load error text and is never buildable.
#[derive(Debug)]
pub struct UnloadedEntry {
  file_name: Option<PathBuf>,
  error: String,
}

impl UnloadedEntry {
  pub fn new(file_name: Option<PathBuf>, error: impl Into<String>) -> Self {
    Self {
      file_name,
      error: error.into(),
    }
  }
}

impl Entry for UnloadedEntry {
  fn needs_building(&self, _configuration: &str) -> bool {
    false
  }

  fn build(&mut self, _monitor: &mut dyn ProgressMonitor, _configuration: &str) -> BuildResult {
    // Not buildable; callers that invoke it anyway get the load error back.
    let mut result = BuildResult::new();
    result.add_error(None, format!("entry failed to load: {}", self.error));
    result
  }

  fn clean(&mut self, _monitor: &mut dyn ProgressMonitor, _configuration: &str) {}

  fn last_build_time(&self, _configuration: &str) -> Option<SystemTime> {
    None
  }

  fn file_name(&self) -> Option<&Path> {
    self.file_name.as_deref()
  }

  fn load_error(&self) -> Option<&str> {
    Some(&self.error)
  }
}
