//! Domain type registry.
//!
//! Project code declares its models with `conduit.model(...)`; the worker turns
//! the registry into the live [`Schema`](crate::schema::Schema).

pub mod lua;
mod registry;

pub use lua::register_model_api;
pub use registry::*;
