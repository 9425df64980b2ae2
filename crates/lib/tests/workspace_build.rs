//! End-to-end orchestration scenarios: collection, ordering, failure
//! propagation, and notification bookkeeping over one workspace.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::SystemTime;

use buildtree_lib::config::ConfigEntry;
use buildtree_lib::entry::Entry;
use buildtree_lib::events::TreeEvent;
use buildtree_lib::execute;
use buildtree_lib::monitor::{NullMonitor, ProgressMonitor};
use buildtree_lib::tree::Workspace;
use buildtree_lib::types::ItemId;

/// Minimal project double: scripted references and failure, logging builds.
#[derive(Debug)]
struct Project {
  name: String,
  references: Vec<String>,
  fail: bool,
  log: Rc<RefCell<Vec<String>>>,
}

impl Project {
  fn new(name: &str, references: &[&str], fail: bool, log: &Rc<RefCell<Vec<String>>>) -> Self {
    Self {
      name: name.to_string(),
      references: references.iter().map(|r| r.to_string()).collect(),
      fail,
      log: Rc::clone(log),
    }
  }
}

impl Entry for Project {
  fn needs_building(&self, _configuration: &str) -> bool {
    true
  }

  fn referenced_items(&self, _configuration: &str) -> Vec<String> {
    self.references.clone()
  }

  fn build(&mut self, _monitor: &mut dyn ProgressMonitor, _configuration: &str) -> execute::BuildResult {
    self.log.borrow_mut().push(self.name.clone());
    let mut result = execute::BuildResult::new();
    if self.fail {
      result.add_error(Some(&self.name), "compilation failed");
    }
    result
  }

  fn clean(&mut self, _monitor: &mut dyn ProgressMonitor, _configuration: &str) {}

  fn last_build_time(&self, _configuration: &str) -> Option<SystemTime> {
    None
  }
}

fn enable(workspace: &mut Workspace, configuration: &str, items: &[ItemId]) {
  let table = workspace.configurations_mut().get_or_insert(configuration);
  for &item in items {
    table.set_entry(item, ConfigEntry::enabled(configuration));
  }
}

#[test]
fn collection_and_ordering_respect_dependencies() {
  let log = Rc::new(RefCell::new(Vec::new()));
  let mut workspace = Workspace::new("solution");
  let root = workspace.root();
  let folder = workspace.add_folder(root, "projects").unwrap();
  // p2 sits before p1 in traversal order but depends on it
  let p2 = workspace
    .add_entry(folder, "p2", Box::new(Project::new("p2", &["p1"], false, &log)))
    .unwrap();
  let p1 = workspace
    .add_entry(folder, "p1", Box::new(Project::new("p1", &[], false, &log)))
    .unwrap();
  enable(&mut workspace, "Debug", &[p1, p2]);

  let collected = workspace.buildable_entries(root, "Debug", false);
  assert_eq!(collected, vec![p2, p1]);

  let ordered = execute::topological_sort(&workspace, &collected, "Debug").unwrap();
  assert_eq!(ordered, vec![p1, p2]);
}

#[test]
fn failing_dependency_skips_dependents_and_aggregates_one_failure() {
  let log = Rc::new(RefCell::new(Vec::new()));
  let mut workspace = Workspace::new("solution");
  let root = workspace.root();
  let folder = workspace.add_folder(root, "projects").unwrap();
  let p1 = workspace
    .add_entry(folder, "p1", Box::new(Project::new("p1", &[], true, &log)))
    .unwrap();
  let p2 = workspace
    .add_entry(folder, "p2", Box::new(Project::new("p2", &["p1"], false, &log)))
    .unwrap();
  enable(&mut workspace, "Debug", &[p1, p2]);

  let ordered = execute::topological_sort(&workspace, &[p1, p2], "Debug").unwrap();
  let outcome = execute::run_ordered(&mut workspace, &ordered, "Debug", &mut NullMonitor);

  assert_eq!(*log.borrow(), vec!["p1".to_string()]);
  assert!(outcome.result.error_count() >= 1);
  let failed = outcome.failed_set();
  assert!(failed.contains(&p1));
  assert!(failed.contains(&p2));
  assert_eq!(failed.len(), 2);
}

#[test]
fn dependency_cycle_reports_one_error_and_builds_nothing() {
  let log = Rc::new(RefCell::new(Vec::new()));
  let mut workspace = Workspace::new("solution");
  let root = workspace.root();
  let p1 = workspace
    .add_entry(root, "p1", Box::new(Project::new("p1", &["p2"], false, &log)))
    .unwrap();
  let p2 = workspace
    .add_entry(root, "p2", Box::new(Project::new("p2", &["p1"], false, &log)))
    .unwrap();
  enable(&mut workspace, "Debug", &[p1, p2]);

  assert_eq!(
    execute::topological_sort(&workspace, &[p1, p2], "Debug"),
    Err(execute::ExecuteError::CyclicDependency)
  );

  let result = execute::build(&mut workspace, root, "Debug", &mut NullMonitor);
  assert_eq!(result.error_count(), 1);
  assert_eq!(result.build_count, 0);
  assert!(log.borrow().is_empty());
}

#[test]
fn unknown_configuration_is_a_valid_nothing_to_build_state() {
  let log = Rc::new(RefCell::new(Vec::new()));
  let mut workspace = Workspace::new("solution");
  let root = workspace.root();
  workspace
    .add_entry(root, "p1", Box::new(Project::new("p1", &[], false, &log)))
    .unwrap();

  assert!(workspace.buildable_entries(root, "Release", true).is_empty());

  let result = execute::build(&mut workspace, root, "Release", &mut NullMonitor);
  assert_eq!(result.error_count(), 0);
  assert_eq!(result.build_count, 0);
}

#[test]
fn add_then_remove_leaves_no_residual_notifications_at_the_root() {
  let log = Rc::new(RefCell::new(Vec::new()));
  let mut workspace = Workspace::new("solution");
  let root = workspace.root();
  let folder = workspace.add_folder(root, "nested").unwrap();

  let seen = Rc::new(RefCell::new(0usize));
  {
    let seen = Rc::clone(&seen);
    workspace.subscribe_workspace(move |_event: &TreeEvent| *seen.borrow_mut() += 1);
  }

  let item = workspace
    .add_entry(folder, "p1", Box::new(Project::new("p1", &[], false, &log)))
    .unwrap();
  workspace.remove_item(item).unwrap();
  let during_lifecycle = *seen.borrow();
  assert!(during_lifecycle > 0);

  // the removed item is fully unwired: nothing reaches the root anymore
  workspace.notify_modified(item, "anything");
  assert_eq!(*seen.borrow(), during_lifecycle);
}
