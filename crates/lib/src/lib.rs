//! conduit-lib: Build and migration pipeline for Conduit applications
//!
//! This crate provides the pieces the `conduit` CLI drives:
//! - `source`: locating and stripping top-level `main` functions in Lua scripts
//! - `isolate`: running an `Executable` in a separate worker process
//! - `build`: staging the entry script and running build hooks
//! - `schema`: schema types, validation and ordered diffs
//! - `model`: the `conduit.model` registry that produces the live schema
//! - `migration`: generating, storing and replaying Lua migrations

pub mod build;
pub mod config;
pub mod consts;
pub mod isolate;
pub mod lua;
pub mod migration;
pub mod model;
pub mod package;
pub mod schema;
pub mod source;
pub mod util;
