//! Lua runtime for worker processes.
//!
//! # Submodules
//!
//! - [`globals`] - The `conduit` runtime module and stderr-bound `print`
//! - [`loaders`] - `require` resolution through the package config
//! - [`runtime`] - Runtime construction, the migration sandbox, error summaries

pub mod globals;
pub mod loaders;
pub mod runtime;

pub use runtime::{create_runtime, create_sandbox, error_summary};
