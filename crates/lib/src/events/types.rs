use std::path::PathBuf;

use crate::entry::EventCapabilities;
use crate::types::ItemId;

/// A change notification travelling the folder hierarchy.
///
/// Every event names the item it happened to and carries enough context for
/// a presentation layer to update itself without re-querying the tree.
/// Events are plain values; listeners receive a shared reference and no way
/// back into the tree, so a handler cannot mutate the subscription graph it
/// is being invoked from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
  /// An item became a direct child of `folder`. `reloading` is set when the
  /// add is half of an in-place replacement.
  ItemAdded {
    folder: ItemId,
    item: ItemId,
    reloading: bool,
  },

  /// An item stopped being a direct child of `folder`.
  ItemRemoved {
    folder: ItemId,
    item: ItemId,
    reloading: bool,
  },

  /// An item was added somewhere at or below the receiving folder. Fires on
  /// the owning folder and every ancestor, independently of `ItemAdded`.
  DescendantItemAdded {
    folder: ItemId,
    item: ItemId,
    reloading: bool,
  },

  /// An item was removed somewhere at or below the receiving folder.
  DescendantItemRemoved {
    folder: ItemId,
    item: ItemId,
    reloading: bool,
  },

  /// A file joined the contained item.
  FileAdded { item: ItemId, file: PathBuf },

  /// A file left the contained item.
  FileRemoved { item: ItemId, file: PathBuf },

  /// A file in the contained item changed on disk.
  FileChanged { item: ItemId, file: PathBuf },

  /// A file in the contained item was renamed.
  FileRenamed {
    item: ItemId,
    old: PathBuf,
    new: PathBuf,
  },

  /// The item gained a reference to another item.
  ReferenceAdded { item: ItemId, reference: String },

  /// The item lost a reference to another item.
  ReferenceRemoved { item: ItemId, reference: String },

  /// Unsaved state of the item changed; `hint` names what ("items",
  /// "name", ...).
  ItemModified { item: ItemId, hint: String },

  /// The item was persisted.
  ItemSaved { item: ItemId },
}

impl TreeEvent {
  /// The item the event is about.
  pub fn item(&self) -> ItemId {
    match self {
      TreeEvent::ItemAdded { item, .. }
      | TreeEvent::ItemRemoved { item, .. }
      | TreeEvent::DescendantItemAdded { item, .. }
      | TreeEvent::DescendantItemRemoved { item, .. }
      | TreeEvent::FileAdded { item, .. }
      | TreeEvent::FileRemoved { item, .. }
      | TreeEvent::FileChanged { item, .. }
      | TreeEvent::FileRenamed { item, .. }
      | TreeEvent::ReferenceAdded { item, .. }
      | TreeEvent::ReferenceRemoved { item, .. }
      | TreeEvent::ItemModified { item, .. }
      | TreeEvent::ItemSaved { item } => *item,
    }
  }

  /// Whether `capabilities` covers this event's category. Structural and
  /// modified events are always covered; file, reference, and save events
  /// require the matching capability on the originating item's wiring.
  pub fn covered_by(&self, capabilities: EventCapabilities) -> bool {
    match self {
      TreeEvent::FileAdded { .. }
      | TreeEvent::FileRemoved { .. }
      | TreeEvent::FileChanged { .. }
      | TreeEvent::FileRenamed { .. } => capabilities.file_events,
      TreeEvent::ReferenceAdded { .. } | TreeEvent::ReferenceRemoved { .. } => capabilities.reference_events,
      TreeEvent::ItemSaved { .. } => capabilities.save_events,
      _ => true,
    }
  }
}
