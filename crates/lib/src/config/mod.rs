//! Build configuration tables.
//!
//! A configuration is a named build profile. A workspace carries one table
//! per profile recording, for each item, whether the item participates in a
//! build of that profile and which configuration name the item itself should
//! be invoked with. Absence of an entry means "not buildable under this
//! configuration", a valid nothing-to-build state, never an error.

mod types;

pub use types::*;
