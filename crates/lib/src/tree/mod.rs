//! The workspace aggregate: containment tree, configurations, and the
//! notification relay connecting them.
//!
//! A [`Workspace`] owns every item node in an id-keyed arena. Folders hold
//! an ordered child list plus the event fabric wiring for those children;
//! entries are boxed [`Entry`] implementations supplied from outside. The
//! containment relation is a tree by construction: an item is created
//! directly into its parent and can never be attached twice.
//!
//! Notifications raised anywhere in a subtree are relayed to the listeners
//! of every enclosing folder, innermost first, and terminate exactly once
//! at the workspace's own listeners when the walk reaches the root folder.
//! Structural mutation during an in-flight collection or build pass is
//! unrepresentable here: every mutating operation takes `&mut Workspace`.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::ConfigurationSet;
use crate::entry::{Entry, EntryLoader, EventCapabilities, UnloadedEntry};
use crate::events::{Fabric, SubscriptionId, TreeEvent};
use crate::monitor::ProgressMonitor;
use crate::types::{ItemId, ItemKind};

/// Errors from structural operations on the tree.
///
/// These indicate caller bookkeeping gone stale, not runtime conditions;
/// they are surfaced immediately and never retried internally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
  /// The id does not address a live item in this workspace.
  #[error("{0} does not exist in this workspace")]
  UnknownItem(ItemId),

  /// The operation addressed an item through a folder that does not hold
  /// it.
  #[error("{item} is not held by {folder}")]
  ItemNotInContainer { folder: ItemId, item: ItemId },

  /// The id addresses an entry where a folder was required, or vice versa.
  #[error("{item} is a {actual:?} but a {expected:?} was required")]
  WrongKind {
    item: ItemId,
    expected: ItemKind,
    actual: ItemKind,
  },

  /// The root folder cannot be removed from its own workspace.
  #[error("{0} is the root folder and cannot be removed")]
  CannotRemoveRoot(ItemId),
}

#[derive(Debug)]
enum Payload {
  Folder(FolderState),
  Entry(Box<dyn Entry>),
}

#[derive(Debug, Default)]
struct FolderState {
  children: Vec<ItemId>,
  fabric: Fabric,
}

#[derive(Debug)]
struct ItemNode {
  name: String,
  parent: Option<ItemId>,
  payload: Payload,
}

/// A hierarchical project model: one root folder, nested folders, buildable
/// entries, per-configuration participation tables, and the event relay.
pub struct Workspace {
  name: String,
  nodes: HashMap<ItemId, ItemNode>,
  root: ItemId,
  next_id: u64,
  configurations: ConfigurationSet,
  /// The aggregate's own listener surface; every event whose relay reaches
  /// the root folder is also delivered here, exactly once.
  listeners: Fabric,
}

impl Workspace {
  /// Create a workspace with an empty root folder named after it.
  pub fn new(name: impl Into<String>) -> Self {
    let name = name.into();
    let root = ItemId(0);
    let mut nodes = HashMap::new();
    nodes.insert(
      root,
      ItemNode {
        name: name.clone(),
        parent: None,
        payload: Payload::Folder(FolderState::default()),
      },
    );
    Self {
      name,
      nodes,
      root,
      next_id: 1,
      configurations: ConfigurationSet::new(),
      listeners: Fabric::default(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn root(&self) -> ItemId {
    self.root
  }

  pub fn configurations(&self) -> &ConfigurationSet {
    &self.configurations
  }

  pub fn configurations_mut(&mut self) -> &mut ConfigurationSet {
    &mut self.configurations
  }

  fn alloc_id(&mut self) -> ItemId {
    let id = ItemId(self.next_id);
    self.next_id += 1;
    id
  }

  fn folder_state_mut(&mut self, folder: ItemId) -> &mut FolderState {
    match self.nodes.get_mut(&folder) {
      Some(ItemNode {
        payload: Payload::Folder(state),
        ..
      }) => state,
      _ => panic!("{folder} is not a folder in this workspace"),
    }
  }

  // --- queries ---

  pub fn contains(&self, id: ItemId) -> bool {
    self.nodes.contains_key(&id)
  }

  pub fn item_name(&self, id: ItemId) -> Option<&str> {
    self.nodes.get(&id).map(|node| node.name.as_str())
  }

  pub fn item_kind(&self, id: ItemId) -> Option<ItemKind> {
    self.nodes.get(&id).map(|node| match node.payload {
      Payload::Folder(_) => ItemKind::Folder,
      Payload::Entry(_) => ItemKind::Entry,
    })
  }

  pub fn parent(&self, id: ItemId) -> Option<ItemId> {
    self.nodes.get(&id).and_then(|node| node.parent)
  }

  /// Direct children of `folder` in insertion order; empty for entries and
  /// unknown ids.
  pub fn children(&self, folder: ItemId) -> &[ItemId] {
    match self.nodes.get(&folder) {
      Some(ItemNode {
        payload: Payload::Folder(state),
        ..
      }) => &state.children,
      _ => &[],
    }
  }

  pub fn entry(&self, id: ItemId) -> Option<&dyn Entry> {
    match self.nodes.get(&id) {
      Some(ItemNode {
        payload: Payload::Entry(entry),
        ..
      }) => Some(entry.as_ref()),
      _ => None,
    }
  }

  pub fn entry_mut(&mut self, id: ItemId) -> Option<&mut dyn Entry> {
    match self.nodes.get_mut(&id) {
      Some(ItemNode {
        payload: Payload::Entry(entry),
        ..
      }) => Some(entry.as_mut()),
      _ => None,
    }
  }

  /// `item` and everything below it, preorder.
  pub fn all_items(&self, item: ItemId) -> Vec<ItemId> {
    let mut out = Vec::new();
    self.walk(item, &mut out);
    out
  }

  /// Every entry at or below `item`, preorder.
  pub fn all_entries(&self, item: ItemId) -> Vec<ItemId> {
    self
      .all_items(item)
      .into_iter()
      .filter(|&id| self.item_kind(id) == Some(ItemKind::Entry))
      .collect()
  }

  fn walk(&self, item: ItemId, out: &mut Vec<ItemId>) {
    if !self.contains(item) {
      return;
    }
    out.push(item);
    for &child in self.children(item) {
      self.walk(child, out);
    }
  }

  /// First entry named `name` at or below `folder`, depth-first.
  pub fn find_by_name(&self, folder: ItemId, name: &str) -> Option<ItemId> {
    for &child in self.children(folder) {
      let Some(node) = self.nodes.get(&child) else { continue };
      match &node.payload {
        Payload::Folder(_) => {
          if let Some(found) = self.find_by_name(child, name) {
            return Some(found);
          }
        }
        Payload::Entry(_) => {
          if node.name == name {
            return Some(child);
          }
        }
      }
    }
    None
  }

  /// First entry backed by `path` at or below `folder`, depth-first.
  pub fn find_by_file(&self, folder: ItemId, path: &Path) -> Option<ItemId> {
    for &child in self.children(folder) {
      match self.item_kind(child) {
        Some(ItemKind::Folder) => {
          if let Some(found) = self.find_by_file(child, path) {
            return Some(found);
          }
        }
        Some(ItemKind::Entry) => {
          if self.entry(child).and_then(Entry::file_name) == Some(path) {
            return Some(child);
          }
        }
        None => {}
      }
    }
    None
  }

  /// Whether a build of `configuration` would do any work at or below
  /// `id`. A folder needs building when any child does.
  pub fn needs_building(&self, id: ItemId, configuration: &str) -> bool {
    match self.nodes.get(&id).map(|node| &node.payload) {
      Some(Payload::Folder(state)) => state
        .children
        .iter()
        .any(|&child| self.needs_building(child, configuration)),
      Some(Payload::Entry(entry)) => entry.needs_building(configuration),
      None => false,
    }
  }

  /// The items `id` references under `configuration`, resolved by name
  /// against the whole workspace. Names that match nothing are dropped;
  /// folders reference nothing.
  pub fn referenced_ids(&self, id: ItemId, configuration: &str) -> Vec<ItemId> {
    let Some(entry) = self.entry(id) else {
      return Vec::new();
    };
    entry
      .referenced_items(configuration)
      .iter()
      .filter_map(|name| self.find_by_name(self.root, name))
      .collect()
  }

  // --- structural mutation ---

  /// Add an empty folder under `parent`.
  pub fn add_folder(&mut self, parent: ItemId, name: impl Into<String>) -> Result<ItemId, TreeError> {
    self.insert_item(
      parent,
      name.into(),
      Payload::Folder(FolderState::default()),
      EventCapabilities::ALL,
    )
  }

  /// Add a buildable entry under `parent`. The workspace owns the entry
  /// from here on.
  pub fn add_entry(
    &mut self,
    parent: ItemId,
    name: impl Into<String>,
    entry: Box<dyn Entry>,
  ) -> Result<ItemId, TreeError> {
    let capabilities = entry.capabilities();
    self.insert_item(parent, name.into(), Payload::Entry(entry), capabilities)
  }

  fn insert_item(
    &mut self,
    parent: ItemId,
    name: String,
    payload: Payload,
    capabilities: EventCapabilities,
  ) -> Result<ItemId, TreeError> {
    match self.nodes.get(&parent) {
      Some(ItemNode {
        payload: Payload::Folder(_),
        ..
      }) => {}
      Some(_) => {
        return Err(TreeError::WrongKind {
          item: parent,
          expected: ItemKind::Folder,
          actual: ItemKind::Entry,
        });
      }
      None => return Err(TreeError::UnknownItem(parent)),
    }

    let id = self.alloc_id();
    debug!(parent = %parent, item = %id, name = %name, "adding item");
    self.nodes.insert(
      id,
      ItemNode {
        name,
        parent: Some(parent),
        payload,
      },
    );
    let state = self.folder_state_mut(parent);
    state.children.push(id);
    state.fabric.attach(id, capabilities);

    self.notify_modified(parent, "items");
    self.raise_structural(parent, id, true, false);
    Ok(id)
  }

  /// Remove `item` and everything below it. The removed subtree is dropped
  /// and scrubbed from every configuration.
  pub fn remove_item(&mut self, item: ItemId) -> Result<(), TreeError> {
    if !self.contains(item) {
      return Err(TreeError::UnknownItem(item));
    }
    let Some(parent) = self.parent(item) else {
      return Err(TreeError::CannotRemoveRoot(item));
    };

    debug!(parent = %parent, item = %item, "removing item");
    let state = self.folder_state_mut(parent);
    let position = state
      .children
      .iter()
      .position(|&child| child == item)
      .expect("child list out of sync with parent link");
    debug_assert!(state.fabric.is_wired(item));
    state.children.remove(position);
    state.fabric.detach(item);
    if let Some(node) = self.nodes.get_mut(&item) {
      node.parent = None;
    }

    self.notify_modified(parent, "items");
    self.raise_structural(parent, item, false, false);

    self.dispose_subtree(item);
    Ok(())
  }

  fn dispose_subtree(&mut self, item: ItemId) {
    let mut stack = vec![item];
    while let Some(id) = stack.pop() {
      stack.extend_from_slice(self.children(id));
      self.configurations.remove_item(id);
      self.nodes.remove(&id);
    }
  }

  /// Replace `item`, a direct child entry of `folder`, with `entry` in the
  /// same position. Event wiring and configuration participation move over
  /// to the replacement; the old item is dropped. The structural events
  /// carry the `reloading` flag so listeners can tell a swap from a plain
  /// remove-then-add.
  pub fn replace_entry(
    &mut self,
    folder: ItemId,
    item: ItemId,
    name: impl Into<String>,
    entry: Box<dyn Entry>,
  ) -> Result<ItemId, TreeError> {
    let position = self.position_in_folder(folder, item)?;
    if self.item_kind(item) != Some(ItemKind::Entry) {
      return Err(TreeError::WrongKind {
        item,
        expected: ItemKind::Entry,
        actual: ItemKind::Folder,
      });
    }
    Ok(self.swap_entry(folder, item, position, name.into(), entry))
  }

  /// Reload `item` from its backing file through `loader`, replacing it in
  /// place. A loader failure substitutes a placeholder entry carrying the
  /// error text, so the tree stays structurally consistent. Folders, and
  /// entries without a backing file, reload as themselves.
  pub fn reload_entry(
    &mut self,
    folder: ItemId,
    item: ItemId,
    loader: &dyn EntryLoader,
    monitor: &mut dyn ProgressMonitor,
  ) -> Result<ItemId, TreeError> {
    let position = self.position_in_folder(folder, item)?;

    if self.item_kind(item) == Some(ItemKind::Folder) {
      return Ok(item);
    }
    let Some(path) = self.entry(item).and_then(Entry::file_name).map(Path::to_path_buf) else {
      return Ok(item);
    };

    let old_name = self.nodes[&item].name.clone();
    let (name, new_entry) = match loader.load(monitor, &path) {
      Ok(loaded) => loaded,
      Err(error) => {
        debug!(item = %item, %error, "reload failed, substituting placeholder");
        monitor.report_error(
          &format!("could not reload '{old_name}'"),
          Some(error.as_ref() as &dyn std::error::Error),
        );
        let placeholder: Box<dyn Entry> = Box::new(UnloadedEntry::new(Some(path), error.to_string()));
        (old_name, placeholder)
      }
    };

    Ok(self.swap_entry(folder, item, position, name, new_entry))
  }

  fn position_in_folder(&self, folder: ItemId, item: ItemId) -> Result<usize, TreeError> {
    match self.nodes.get(&folder) {
      Some(ItemNode {
        payload: Payload::Folder(state),
        ..
      }) => state
        .children
        .iter()
        .position(|&child| child == item)
        .ok_or(TreeError::ItemNotInContainer { folder, item }),
      Some(_) => Err(TreeError::WrongKind {
        item: folder,
        expected: ItemKind::Folder,
        actual: ItemKind::Entry,
      }),
      None => Err(TreeError::UnknownItem(folder)),
    }
  }

  fn swap_entry(&mut self, folder: ItemId, item: ItemId, position: usize, name: String, entry: Box<dyn Entry>) -> ItemId {
    let capabilities = entry.capabilities();
    let new_id = self.alloc_id();
    debug!(folder = %folder, old = %item, new = %new_id, "replacing item in place");
    self.nodes.insert(
      new_id,
      ItemNode {
        name,
        parent: Some(folder),
        payload: Payload::Entry(entry),
      },
    );
    let state = self.folder_state_mut(folder);
    state.children[position] = new_id;
    state.fabric.detach(item);
    state.fabric.attach(new_id, capabilities);
    if let Some(node) = self.nodes.get_mut(&item) {
      node.parent = None;
    }
    self.configurations.replace_item(item, new_id);

    self.notify_modified(folder, "items");
    self.raise_structural(folder, item, false, true);
    self.raise_structural(folder, new_id, true, true);

    self.nodes.remove(&item);
    new_id
  }

  /// Rename an item. Announced as a modification, not a structural change.
  pub fn rename_item(&mut self, id: ItemId, name: impl Into<String>) -> Result<(), TreeError> {
    let node = self.nodes.get_mut(&id).ok_or(TreeError::UnknownItem(id))?;
    node.name = name.into();
    self.notify_modified(id, "name");
    Ok(())
  }

  /// Persist every entry at or below `item`, announcing each successful
  /// save. Stops at the first error.
  pub fn save(&mut self, item: ItemId, monitor: &mut dyn ProgressMonitor) -> io::Result<()> {
    for id in self.all_entries(item) {
      if let Some(entry) = self.entry_mut(id) {
        entry.save(monitor)?;
      }
      self.notify_saved(id);
    }
    Ok(())
  }

  // --- notifications ---

  /// Announce a file joining the entry `item`.
  pub fn notify_file_added(&mut self, item: ItemId, file: impl Into<PathBuf>) {
    self.relay_item_event(
      item,
      TreeEvent::FileAdded {
        item,
        file: file.into(),
      },
    );
  }

  /// Announce a file leaving the entry `item`.
  pub fn notify_file_removed(&mut self, item: ItemId, file: impl Into<PathBuf>) {
    self.relay_item_event(
      item,
      TreeEvent::FileRemoved {
        item,
        file: file.into(),
      },
    );
  }

  /// Announce a file of the entry `item` changing on disk.
  pub fn notify_file_changed(&mut self, item: ItemId, file: impl Into<PathBuf>) {
    self.relay_item_event(
      item,
      TreeEvent::FileChanged {
        item,
        file: file.into(),
      },
    );
  }

  /// Announce a file rename inside the entry `item`.
  pub fn notify_file_renamed(&mut self, item: ItemId, old: impl Into<PathBuf>, new: impl Into<PathBuf>) {
    self.relay_item_event(
      item,
      TreeEvent::FileRenamed {
        item,
        old: old.into(),
        new: new.into(),
      },
    );
  }

  /// Announce `item` gaining a reference.
  pub fn notify_reference_added(&mut self, item: ItemId, reference: impl Into<String>) {
    self.relay_item_event(
      item,
      TreeEvent::ReferenceAdded {
        item,
        reference: reference.into(),
      },
    );
  }

  /// Announce `item` losing a reference.
  pub fn notify_reference_removed(&mut self, item: ItemId, reference: impl Into<String>) {
    self.relay_item_event(
      item,
      TreeEvent::ReferenceRemoved {
        item,
        reference: reference.into(),
      },
    );
  }

  /// Announce unsaved changes on `item`; `hint` names what changed.
  pub fn notify_modified(&mut self, item: ItemId, hint: &str) {
    self.relay_item_event(
      item,
      TreeEvent::ItemModified {
        item,
        hint: hint.to_string(),
      },
    );
  }

  /// Announce that `item` was persisted.
  pub fn notify_saved(&mut self, item: ItemId) {
    self.relay_item_event(item, TreeEvent::ItemSaved { item });
  }

  // --- subscriptions ---

  /// Listen to everything relayed through `folder`.
  pub fn subscribe(
    &mut self,
    folder: ItemId,
    listener: impl FnMut(&TreeEvent) + 'static,
  ) -> Result<SubscriptionId, TreeError> {
    match self.nodes.get_mut(&folder) {
      Some(ItemNode {
        payload: Payload::Folder(state),
        ..
      }) => Ok(state.fabric.subscribe(Box::new(listener))),
      Some(_) => Err(TreeError::WrongKind {
        item: folder,
        expected: ItemKind::Folder,
        actual: ItemKind::Entry,
      }),
      None => Err(TreeError::UnknownItem(folder)),
    }
  }

  pub fn unsubscribe(&mut self, folder: ItemId, subscription: SubscriptionId) -> Result<bool, TreeError> {
    match self.nodes.get_mut(&folder) {
      Some(ItemNode {
        payload: Payload::Folder(state),
        ..
      }) => Ok(state.fabric.unsubscribe(subscription)),
      Some(_) => Err(TreeError::WrongKind {
        item: folder,
        expected: ItemKind::Folder,
        actual: ItemKind::Entry,
      }),
      None => Err(TreeError::UnknownItem(folder)),
    }
  }

  /// Listen at the aggregate level: every event that reaches the root
  /// folder arrives here once.
  pub fn subscribe_workspace(&mut self, listener: impl FnMut(&TreeEvent) + 'static) -> SubscriptionId {
    self.listeners.subscribe(Box::new(listener))
  }

  pub fn unsubscribe_workspace(&mut self, subscription: SubscriptionId) -> bool {
    self.listeners.unsubscribe(subscription)
  }

  // --- relay core ---

  fn dispatch_folder(&mut self, folder: ItemId, event: &TreeEvent) {
    if let Some(ItemNode {
      payload: Payload::Folder(state),
      ..
    }) = self.nodes.get_mut(&folder)
    {
      state.fabric.dispatch(event);
    }
  }

  /// Relay an item-scoped event: the origin's own listener surface first
  /// (folders only), then every enclosing folder innermost-out, then the
  /// workspace listeners when the walk reached the root.
  fn relay_item_event(&mut self, origin: ItemId, event: TreeEvent) {
    if let Some(parent) = self.parent(origin) {
      let capabilities = match self.nodes.get(&parent) {
        Some(ItemNode {
          payload: Payload::Folder(state),
          ..
        }) => state
          .fabric
          .capabilities(origin)
          .expect("attached item is missing its relay entry"),
        _ => return,
      };
      if !event.covered_by(capabilities) {
        debug!(item = %origin, "dropping notification outside the item's declared capabilities");
        return;
      }
    }

    self.dispatch_folder(origin, &event);
    let mut child = origin;
    while let Some(folder) = self.parent(child) {
      self.dispatch_folder(folder, &event);
      child = folder;
    }
    if child == self.root {
      self.listeners.dispatch(&event);
    }
  }

  /// Raise a structural change: the owning folder's direct event to its own
  /// listeners, the descendant variant to the owning folder and every
  /// ancestor, and the direct event once more at the aggregate level.
  fn raise_structural(&mut self, folder: ItemId, item: ItemId, added: bool, reloading: bool) {
    let direct = if added {
      TreeEvent::ItemAdded { folder, item, reloading }
    } else {
      TreeEvent::ItemRemoved { folder, item, reloading }
    };
    let descendant = if added {
      TreeEvent::DescendantItemAdded { folder, item, reloading }
    } else {
      TreeEvent::DescendantItemRemoved { folder, item, reloading }
    };

    self.dispatch_folder(folder, &direct);

    let mut current = Some(folder);
    let mut last = folder;
    while let Some(ancestor) = current {
      self.dispatch_folder(ancestor, &descendant);
      last = ancestor;
      current = self.parent(ancestor);
    }
    if last == self.root {
      self.listeners.dispatch(&direct);
    }
  }
}
