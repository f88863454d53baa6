//! Data model schemas.
//!
//! # Submodules
//!
//! - [`types`] - Schema, table and column descriptions (JSON via serde)
//! - [`validate`] - Structural rules every schema must satisfy
//! - [`diff`] - Ordered changes between two schemas
//! - [`builder`] - Incremental construction, exposed to migrations as `db`

pub mod builder;
pub mod diff;
mod types;
mod validate;

pub use builder::{SchemaBuilder, column_from_lua};
pub use diff::{ColumnProperty, SchemaChange, SchemaDiff};
pub use types::*;
