//! buildtree-lib: build orchestration for hierarchical project models.
//!
//! This crate provides the scheduling and notification core for a tree of
//! buildable items:
//! - `Workspace`: the containment tree, configurations, and event relay
//! - `Entry`: the abstract buildable leaf a compiler or tool plugs into
//! - `execute`: buildable-set collection, dependency ordering, and the
//!   build loop with failure propagation and cooperative cancellation
//! - `events`: change notifications relayed through the folder hierarchy
//!
//! File formats, path heuristics, persistence, and UI all live outside;
//! they reach this core through the `Entry`, `EntryLoader`, and
//! `ProgressMonitor` traits.

mod collect;

pub mod config;
pub mod entry;
pub mod events;
pub mod execute;
pub mod monitor;
pub mod tree;
pub mod types;
pub mod util;
