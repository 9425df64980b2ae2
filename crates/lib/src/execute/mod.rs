//! Build execution.
//!
//! Entry points for building, cleaning, and staleness queries over a
//! workspace subtree. A build run:
//!
//! 1. Collects the buildable set for the configuration, references expanded
//! 2. Orders it so every dependency precedes its dependents
//! 3. Runs the ordered set, skipping dependents of failed items
//!
//! A cyclic build order aborts before anything runs and surfaces as exactly
//! one error in the aggregate. Cleaning and last-build-time queries reuse
//! the containment recursion without ordering or failure propagation.

pub mod dag;
pub mod types;

use std::time::SystemTime;

use tracing::{debug, info};

use crate::config::WorkspaceConfiguration;
use crate::monitor::ProgressMonitor;
use crate::tree::Workspace;
use crate::types::{ItemId, ItemKind};

pub use dag::{DependencyGraph, topological_sort};
pub use types::{BuildMessage, BuildResult, ExecuteError, RunOutcome, Severity};

/// Build everything under `folder` for `configuration`.
///
/// The aggregate [`BuildResult`] is the single surface to inspect: zero
/// errors does not imply zero warnings, and a cyclic dependency reports
/// exactly one error with no builds performed.
pub fn build(
  workspace: &mut Workspace,
  folder: ItemId,
  configuration: &str,
  monitor: &mut dyn ProgressMonitor,
) -> BuildResult {
  let entries = workspace.buildable_entries(folder, configuration, true);
  let ordered = match topological_sort(workspace, &entries, configuration) {
    Ok(ordered) => ordered,
    Err(error) => {
      monitor.report_error("cyclic dependencies are not supported", Some(&error));
      let mut result = BuildResult::new();
      result.add_error(workspace.item_name(folder), "cyclic dependencies are not supported");
      return result;
    }
  };

  info!(folder = %folder, configuration, items = ordered.len(), "starting build");
  let label = format!("Building {}", workspace.item_name(folder).unwrap_or_default());
  monitor.begin_task(&label, ordered.len());
  let outcome = run_ordered(workspace, &ordered, configuration, monitor);
  monitor.end_task();

  info!(
    built = outcome.built.len(),
    failed = outcome.failed.len(),
    skipped = outcome.skipped.len(),
    errors = outcome.result.error_count(),
    warnings = outcome.result.warning_count(),
    cancelled = outcome.cancelled,
    "build finished"
  );
  outcome.result
}

/// Run already-ordered items for `configuration`, skipping any item whose
/// referenced items already failed.
///
/// The check is against direct references, but because the input is
/// dependency-ordered and skipped items join the failed set themselves,
/// failure propagates through arbitrarily long dependency chains: an item
/// never starts while any transitive dependency has failed. One monitor
/// step is reported per item whether it was invoked or skipped. A
/// cancellation request stops the loop at the next item boundary and
/// returns the partial aggregate; that is a normal exit, not an error.
pub fn run_ordered(
  workspace: &mut Workspace,
  ordered: &[ItemId],
  configuration: &str,
  monitor: &mut dyn ProgressMonitor,
) -> RunOutcome {
  let mut outcome = RunOutcome::default();
  for &item in ordered {
    if monitor.cancel_requested() {
      debug!(configuration, "run cancelled");
      outcome.cancelled = true;
      break;
    }

    let failed_dependency = workspace
      .referenced_ids(item, configuration)
      .into_iter()
      .find(|dependency| outcome.failed.contains(dependency) || outcome.skipped.contains_key(dependency));

    if let Some(culprit) = failed_dependency {
      debug!(item = %item, culprit = %culprit, "skipping item, dependency failed");
      outcome.skipped.insert(item, culprit);
    } else if let Some(result) = build_item(workspace, item, configuration, monitor) {
      let failed = result.failed();
      outcome.result.append(result);
      outcome.result.build_count += 1;
      if failed {
        outcome.failed.insert(item);
      } else {
        outcome.built.push(item);
      }
    }
    monitor.step(1);
  }
  outcome
}

/// Invoke one entry's build with its item-local configuration name.
fn build_item(
  workspace: &mut Workspace,
  item: ItemId,
  configuration: &str,
  monitor: &mut dyn ProgressMonitor,
) -> Option<BuildResult> {
  let entry_configuration = workspace
    .configurations()
    .get(configuration)
    .and_then(|table| table.entry_configuration(item))
    .unwrap_or(configuration)
    .to_string();
  let entry = workspace.entry_mut(item)?;
  Some(entry.build(monitor, &entry_configuration))
}

/// Clean everything build-enabled under `folder` for `configuration`.
///
/// Containment recursion only: clean order does not consult build
/// dependencies and failures do not propagate. An unknown configuration
/// cleans nothing.
pub fn clean(workspace: &mut Workspace, folder: ItemId, configuration: &str, monitor: &mut dyn ProgressMonitor) {
  let mut plan = Vec::new();
  {
    let Some(table) = workspace.configurations().get(configuration) else {
      return;
    };
    collect_clean_plan(workspace, folder, table, configuration, &mut plan);
  }
  debug!(folder = %folder, configuration, items = plan.len(), "cleaning");
  for (item, entry_configuration) in plan {
    if let Some(entry) = workspace.entry_mut(item) {
      entry.clean(monitor, &entry_configuration);
    }
  }
}

fn collect_clean_plan(
  workspace: &Workspace,
  folder: ItemId,
  table: &WorkspaceConfiguration,
  configuration: &str,
  plan: &mut Vec<(ItemId, String)>,
) {
  for &child in workspace.children(folder) {
    match workspace.item_kind(child) {
      Some(ItemKind::Folder) => collect_clean_plan(workspace, child, table, configuration, plan),
      Some(ItemKind::Entry) if table.build_enabled(child) => {
        let entry_configuration = table.entry_configuration(child).unwrap_or(configuration).to_string();
        plan.push((child, entry_configuration));
      }
      _ => {}
    }
  }
}

/// Earliest last-build time at or below `item` for `configuration`.
///
/// A folder is as stale as its stalest child: the minimum over children,
/// where `None` (never built) is the minimum. An empty folder is `None`
/// too, since nothing has ever been built there.
pub fn last_build_time(workspace: &Workspace, item: ItemId, configuration: &str) -> Option<SystemTime> {
  match workspace.item_kind(item)? {
    ItemKind::Entry => {
      let entry_configuration = workspace
        .configurations()
        .get(configuration)
        .and_then(|table| table.entry_configuration(item))
        .unwrap_or(configuration);
      workspace.entry(item)?.last_build_time(entry_configuration)
    }
    ItemKind::Folder => {
      let children = workspace.children(item);
      if children.is_empty() {
        return None;
      }
      let mut earliest: Option<SystemTime> = None;
      for &child in children {
        let time = last_build_time(workspace, child, configuration)?;
        earliest = Some(match earliest {
          Some(current) => current.min(time),
          None => time,
        });
      }
      earliest
    }
  }
}
