use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::ItemId;

/// Per-item participation record inside a [`WorkspaceConfiguration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
  /// Whether the item is built when this configuration is built.
  pub build: bool,

  /// The item-local configuration name used when invoking the item.
  ///
  /// A workspace-level "Debug" can map to a per-item "DebugWin32" and so on;
  /// build and clean pass this name through to the entry.
  pub entry_configuration: String,
}

impl ConfigEntry {
  /// Entry that participates in the build under `entry_configuration`.
  pub fn enabled(entry_configuration: impl Into<String>) -> Self {
    Self {
      build: true,
      entry_configuration: entry_configuration.into(),
    }
  }

  /// Entry that is mapped but excluded from the build.
  pub fn disabled(entry_configuration: impl Into<String>) -> Self {
    Self {
      build: false,
      entry_configuration: entry_configuration.into(),
    }
  }
}

/// One named build profile: item id to participation record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfiguration {
  entries: HashMap<ItemId, ConfigEntry>,
}

impl WorkspaceConfiguration {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_entry(&mut self, item: ItemId, entry: ConfigEntry) {
    self.entries.insert(item, entry);
  }

  pub fn remove_entry(&mut self, item: ItemId) -> Option<ConfigEntry> {
    self.entries.remove(&item)
  }

  pub fn entry_for(&self, item: ItemId) -> Option<&ConfigEntry> {
    self.entries.get(&item)
  }

  /// Whether `item` is built under this configuration. Unmapped items are
  /// not built.
  pub fn build_enabled(&self, item: ItemId) -> bool {
    self.entries.get(&item).is_some_and(|entry| entry.build)
  }

  /// The item-local configuration name for `item`, if mapped.
  pub fn entry_configuration(&self, item: ItemId) -> Option<&str> {
    self.entries.get(&item).map(|entry| entry.entry_configuration.as_str())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// All build profiles known to a workspace, keyed by configuration name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationSet {
  configurations: HashMap<String, WorkspaceConfiguration>,
}

impl ConfigurationSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: impl Into<String>, configuration: WorkspaceConfiguration) {
    self.configurations.insert(name.into(), configuration);
  }

  pub fn get(&self, name: &str) -> Option<&WorkspaceConfiguration> {
    self.configurations.get(name)
  }

  pub fn get_mut(&mut self, name: &str) -> Option<&mut WorkspaceConfiguration> {
    self.configurations.get_mut(name)
  }

  /// The configuration named `name`, created empty if missing.
  pub fn get_or_insert(&mut self, name: &str) -> &mut WorkspaceConfiguration {
    self.configurations.entry(name.to_string()).or_default()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.configurations.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.configurations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.configurations.is_empty()
  }

  /// Drop `item` from every configuration. Called when an item leaves the
  /// tree for good.
  pub fn remove_item(&mut self, item: ItemId) {
    for configuration in self.configurations.values_mut() {
      configuration.remove_entry(item);
    }
  }

  /// Move `old`'s entries over to `new` in every configuration, preserving
  /// enablement across an in-place item replacement.
  pub fn replace_item(&mut self, old: ItemId, new: ItemId) {
    for configuration in self.configurations.values_mut() {
      if let Some(entry) = configuration.remove_entry(old) {
        configuration.set_entry(new, entry);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unmapped_item_is_not_buildable() {
    let configuration = WorkspaceConfiguration::new();
    assert!(!configuration.build_enabled(ItemId(1)));
    assert!(configuration.entry_configuration(ItemId(1)).is_none());
  }

  #[test]
  fn disabled_entry_is_mapped_but_not_built() {
    let mut configuration = WorkspaceConfiguration::new();
    configuration.set_entry(ItemId(1), ConfigEntry::disabled("Debug"));

    assert!(!configuration.build_enabled(ItemId(1)));
    assert_eq!(configuration.entry_configuration(ItemId(1)), Some("Debug"));
  }

  #[test]
  fn entry_configuration_maps_to_item_local_name() {
    let mut configuration = WorkspaceConfiguration::new();
    configuration.set_entry(ItemId(2), ConfigEntry::enabled("DebugWin32"));

    assert!(configuration.build_enabled(ItemId(2)));
    assert_eq!(configuration.entry_configuration(ItemId(2)), Some("DebugWin32"));
  }

  #[test]
  fn replace_item_preserves_enablement() {
    let mut set = ConfigurationSet::new();
    let debug = set.get_or_insert("Debug");
    debug.set_entry(ItemId(1), ConfigEntry::enabled("Debug"));
    let release = set.get_or_insert("Release");
    release.set_entry(ItemId(1), ConfigEntry::disabled("Release"));

    set.replace_item(ItemId(1), ItemId(9));

    assert!(set.get("Debug").unwrap().build_enabled(ItemId(9)));
    assert!(!set.get("Debug").unwrap().build_enabled(ItemId(1)));
    assert_eq!(set.get("Release").unwrap().entry_configuration(ItemId(9)), Some("Release"));
  }

  #[test]
  fn remove_item_scrubs_every_configuration() {
    let mut set = ConfigurationSet::new();
    set.get_or_insert("Debug").set_entry(ItemId(1), ConfigEntry::enabled("Debug"));
    set.get_or_insert("Release").set_entry(ItemId(1), ConfigEntry::enabled("Release"));

    set.remove_item(ItemId(1));

    assert!(set.get("Debug").unwrap().is_empty());
    assert!(set.get("Release").unwrap().is_empty());
  }

  #[test]
  fn configuration_set_roundtrips_through_json() {
    let mut set = ConfigurationSet::new();
    let debug = set.get_or_insert("Debug");
    debug.set_entry(ItemId(1), ConfigEntry::enabled("Debug"));
    debug.set_entry(ItemId(2), ConfigEntry::disabled("DebugNet"));

    let json = serde_json::to_string(&set).unwrap();
    let back: ConfigurationSet = serde_json::from_str(&json).unwrap();

    assert!(back.get("Debug").unwrap().build_enabled(ItemId(1)));
    assert!(!back.get("Debug").unwrap().build_enabled(ItemId(2)));
    assert_eq!(back.get("Debug").unwrap().entry_configuration(ItemId(2)), Some("DebugNet"));
  }
}
