//! Schema migrations.
//!
//! Migrations are Lua modules under `<project>/migrations/` named
//! `{version:08}_{name}.migration.lua`. Replaying them in version order gives
//! the schema the database has; diffing that against the project's live
//! models in a worker gives the next migration.

mod executable;
mod generate;
mod replay;
pub mod source;
mod store;

use std::path::PathBuf;

use thiserror::Error;

use crate::build::BuildError;
use crate::isolate::IsolateError;
use crate::schema::SchemaError;

pub use executable::{MigrationDiffExecutable, MigrationDiffOutput};
pub use generate::{GeneratedMigration, generate_migration};
pub use replay::replay;
pub use store::{MigrationFile, MigrationStore, is_valid_name};

#[derive(Debug, Error)]
pub enum MigrationError {
  #[error("invalid migration name '{0}': use lowercase letters, digits and underscores")]
  InvalidName(String),

  #[error("cannot list migrations in {dir}: {source}")]
  Discover {
    dir: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("migrations {first} and {second} share version {version}")]
  DuplicateVersion {
    version: u32,
    first: PathBuf,
    second: PathBuf,
  },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("migration {0} uses the highest possible version")]
  VersionExhausted(PathBuf),

  #[error("migration {0} already exists")]
  Exists(PathBuf),

  #[error("{}{message}", path.as_ref().map(|p| format!("{}: ", p.display())).unwrap_or_default())]
  Lua { path: Option<PathBuf>, message: String },

  #[error("migrations describe an invalid schema: {0}")]
  Schema(#[from] SchemaError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Isolate(#[from] IsolateError),
}
