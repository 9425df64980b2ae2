//! Shared utilities.
//!
//! Currently only test support; kept as a module so future helpers have a
//! home that matches the crate layout.

#[cfg(test)]
pub mod testutil;
