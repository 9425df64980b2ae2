//! Buildable-set collection.
//!
//! Walking the containment tree for a configuration yields the candidate
//! build set: every build-enabled entry, optionally expanded with every
//! item those entries reference. Expansion dedups through a seen-set, which
//! is also what makes reference cycles harmless here: an item already
//! collected is never expanded again. Cycles only become an error later,
//! when the set is ordered for building.

use std::collections::HashSet;

use crate::config::WorkspaceConfiguration;
use crate::tree::Workspace;
use crate::types::{ItemId, ItemKind};

impl Workspace {
  /// Collect the buildable entries under `folder` for `configuration`, in
  /// discovery order: containment traversal first, reference expansion as
  /// it happens.
  ///
  /// An unknown configuration yields an empty set, a valid
  /// nothing-to-build state, not an error. With `expand_references` set,
  /// every item a collected entry references (transitively) is pulled in
  /// exactly once, whether or not it is build-enabled or located under
  /// `folder`. The configuration table is resolved once here and passed
  /// down; recursion never reaches back up for it.
  pub fn buildable_entries(&self, folder: ItemId, configuration: &str, expand_references: bool) -> Vec<ItemId> {
    let mut list = Vec::new();
    let Some(table) = self.configurations().get(configuration) else {
      return list;
    };
    let mut seen = HashSet::new();
    self.collect_folder(folder, table, configuration, expand_references, &mut list, &mut seen);
    list
  }

  fn collect_folder(
    &self,
    folder: ItemId,
    table: &WorkspaceConfiguration,
    configuration: &str,
    expand_references: bool,
    list: &mut Vec<ItemId>,
    seen: &mut HashSet<ItemId>,
  ) {
    for &child in self.children(folder) {
      match self.item_kind(child) {
        Some(ItemKind::Folder) => {
          self.collect_folder(child, table, configuration, expand_references, list, seen);
        }
        Some(ItemKind::Entry) if table.build_enabled(child) => {
          self.collect_with_references(child, configuration, expand_references, list, seen);
        }
        _ => {}
      }
    }
  }

  fn collect_with_references(
    &self,
    item: ItemId,
    configuration: &str,
    expand_references: bool,
    list: &mut Vec<ItemId>,
    seen: &mut HashSet<ItemId>,
  ) {
    if !seen.insert(item) {
      return;
    }
    list.push(item);
    if expand_references {
      for referenced in self.referenced_ids(item, configuration) {
        self.collect_with_references(referenced, configuration, expand_references, list, seen);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ConfigEntry;
  use crate::util::testutil::StubEntry;

  /// root -> libs -> core, util; root -> app (depends on core, util)
  fn sample() -> (Workspace, ItemId, ItemId, ItemId, ItemId) {
    let mut workspace = Workspace::new("demo");
    let root = workspace.root();
    let libs = workspace.add_folder(root, "libs").unwrap();
    let core = workspace.add_entry(libs, "core", Box::new(StubEntry::new("core"))).unwrap();
    let util = workspace.add_entry(libs, "util", Box::new(StubEntry::new("util"))).unwrap();
    let app = StubEntry::new("app").with_references(&["core", "util"]);
    let app = workspace.add_entry(root, "app", Box::new(app)).unwrap();
    (workspace, root, core, util, app)
  }

  fn enable(workspace: &mut Workspace, configuration: &str, items: &[ItemId]) {
    let table = workspace.configurations_mut().get_or_insert(configuration);
    for &item in items {
      table.set_entry(item, ConfigEntry::enabled(configuration));
    }
  }

  #[test]
  fn collects_enabled_entries_in_traversal_order() {
    let (mut workspace, root, core, util, app) = sample();
    enable(&mut workspace, "Debug", &[core, util, app]);

    let collected = workspace.buildable_entries(root, "Debug", false);
    assert_eq!(collected, vec![core, util, app]);
  }

  #[test]
  fn disabled_and_unmapped_entries_are_filtered() {
    let (mut workspace, root, core, util, app) = sample();
    enable(&mut workspace, "Debug", &[core, app]);
    workspace
      .configurations_mut()
      .get_mut("Debug")
      .unwrap()
      .set_entry(util, ConfigEntry::disabled("Debug"));

    let collected = workspace.buildable_entries(root, "Debug", false);
    assert_eq!(collected, vec![core, app]);
  }

  #[test]
  fn unknown_configuration_yields_an_empty_set() {
    let (workspace, root, ..) = sample();
    assert!(workspace.buildable_entries(root, "Release", true).is_empty());
  }

  #[test]
  fn expansion_pulls_in_references_of_collected_entries() {
    let (mut workspace, root, core, util, app) = sample();
    // only app is enabled; its references come along anyway
    enable(&mut workspace, "Debug", &[app]);

    let collected = workspace.buildable_entries(root, "Debug", true);
    assert_eq!(collected, vec![app, core, util]);
  }

  #[test]
  fn expansion_deduplicates_shared_references() {
    let (mut workspace, root, core, util, app) = sample();
    enable(&mut workspace, "Debug", &[core, util, app]);

    let collected = workspace.buildable_entries(root, "Debug", true);
    assert_eq!(collected, vec![core, util, app]);
  }

  #[test]
  fn reference_cycles_are_collected_without_error() {
    let mut workspace = Workspace::new("demo");
    let root = workspace.root();
    let ping = StubEntry::new("ping").with_references(&["pong"]);
    let ping = workspace.add_entry(root, "ping", Box::new(ping)).unwrap();
    let pong = StubEntry::new("pong").with_references(&["ping"]);
    let pong = workspace.add_entry(root, "pong", Box::new(pong)).unwrap();
    enable(&mut workspace, "Debug", &[ping]);

    let collected = workspace.buildable_entries(root, "Debug", true);
    assert_eq!(collected, vec![ping, pong]);
  }

  #[test]
  fn collection_is_idempotent_on_an_unchanged_tree() {
    let (mut workspace, root, core, util, app) = sample();
    enable(&mut workspace, "Debug", &[core, util, app]);

    let first = workspace.buildable_entries(root, "Debug", true);
    let second = workspace.buildable_entries(root, "Debug", true);
    assert_eq!(first, second);
  }

  #[test]
  fn collection_is_scoped_to_the_requested_folder() {
    let (mut workspace, root, core, util, app) = sample();
    enable(&mut workspace, "Debug", &[core, util, app]);
    let libs = workspace.parent(core).unwrap();

    let collected = workspace.buildable_entries(libs, "Debug", false);
    assert_eq!(collected, vec![core, util]);
    let _ = (root, app);
  }
}
