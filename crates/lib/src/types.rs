use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of an item inside a [`Workspace`](crate::tree::Workspace).
///
/// Ids are allocated sequentially and never reused, so a stale id held across
/// a removal can never silently address a different item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub(crate) u64);

impl fmt::Display for ItemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "item#{}", self.0)
  }
}

/// The structural kind of an item node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
  /// A container holding an ordered list of child items.
  Folder,
  /// A buildable leaf.
  Entry,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn item_id_display() {
    assert_eq!(ItemId(7).to_string(), "item#7");
  }

  #[test]
  fn item_id_serializes_as_plain_number() {
    let json = serde_json::to_string(&ItemId(42)).unwrap();
    assert_eq!(json, "42");
    let back: ItemId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ItemId(42));
  }
}
