//! Event propagation fabric.
//!
//! Each folder owns one [`Fabric`]: the bookkeeping for its attached
//! children plus its own direct listeners. Attaching a child creates
//! exactly one relay entry recording the child's capabilities; detaching
//! removes it. The at-most-once delivery guarantee rests entirely on that
//! symmetry, so a mismatched attach/detach pair is a programming-contract
//! violation and panics rather than silently double-delivering or leaking
//! a subscription.

mod types;

pub use types::*;

use std::collections::HashMap;
use std::fmt;

use crate::entry::EventCapabilities;
use crate::types::ItemId;

/// Handle returned by subscription calls; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A registered event listener.
pub type Listener = Box<dyn FnMut(&TreeEvent)>;

/// Relay bookkeeping for one folder: wired children and direct listeners.
#[derive(Default)]
pub struct Fabric {
  wired: HashMap<ItemId, EventCapabilities>,
  listeners: Vec<(SubscriptionId, Listener)>,
  next_subscription: u64,
}

impl fmt::Debug for Fabric {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Fabric")
      .field("wired", &self.wired)
      .field("listeners", &self.listeners.len())
      .finish()
  }
}

impl Fabric {
  /// Wire a child. Panics if the child is already attached.
  pub(crate) fn attach(&mut self, child: ItemId, capabilities: EventCapabilities) {
    if self.wired.insert(child, capabilities).is_some() {
      panic!("{child} attached twice to the same folder");
    }
  }

  /// Unwire a child. Panics if the child was never attached: a detach
  /// without its matching attach means the caller's bookkeeping is already
  /// broken.
  pub(crate) fn detach(&mut self, child: ItemId) {
    if self.wired.remove(&child).is_none() {
      panic!("{child} detached from a folder it was never attached to");
    }
  }

  pub(crate) fn is_wired(&self, child: ItemId) -> bool {
    self.wired.contains_key(&child)
  }

  /// Capability set recorded when `child` was attached.
  pub(crate) fn capabilities(&self, child: ItemId) -> Option<EventCapabilities> {
    self.wired.get(&child).copied()
  }

  pub(crate) fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
    let id = SubscriptionId(self.next_subscription);
    self.next_subscription += 1;
    self.listeners.push((id, listener));
    id
  }

  /// Remove a listener. Returns whether it was present.
  pub(crate) fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
    let before = self.listeners.len();
    self.listeners.retain(|(id, _)| *id != subscription);
    self.listeners.len() != before
  }

  pub(crate) fn dispatch(&mut self, event: &TreeEvent) {
    for (_, listener) in &mut self.listeners {
      listener(event);
    }
  }
}
