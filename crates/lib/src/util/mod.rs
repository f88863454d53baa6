//! Shared utilities.
//!
//! Content hashing plus helpers used by the crate's tests.

pub mod hash;

#[cfg(test)]
pub mod testutil;
