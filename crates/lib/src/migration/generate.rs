use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::MigrationError;
use super::executable::MigrationDiffExecutable;
use super::replay::replay;
use super::store::{MigrationStore, is_valid_name, next_version_of};
use crate::build::BuildManager;
use crate::isolate::{IsolateRequest, LogHandler};

/// The result of [`generate_migration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedMigration {
  pub version: u32,
  /// Path of the written file; `None` when the schema was already current.
  pub path: Option<PathBuf>,
  pub changes: Vec<String>,
  pub tables: Vec<String>,
}

/// Generate the next migration for the project `manager` builds.
///
/// The existing migrations are replayed to the schema they describe, the
/// entry script is staged, and a worker diffs that schema against the
/// project's live models. A file is written only when there are changes.
pub async fn generate_migration(
  manager: &BuildManager,
  store: &MigrationStore,
  name: &str,
  log: Option<LogHandler<'_>>,
) -> Result<GeneratedMigration, MigrationError> {
  if !is_valid_name(name) {
    return Err(MigrationError::InvalidName(name.to_string()));
  }

  let files = store.list()?;
  let current = replay(&files)?;
  let version = next_version_of(&files)?;
  info!(migrations = files.len(), tables = current.tables.len(), "replayed existing migrations");

  let staged = manager.prepare()?;
  let request = IsolateRequest::new(
    MigrationDiffExecutable {
      input_schema: current,
      version: Some(version),
    },
    manager.context().package_config.clone(),
    manager.imports(&staged),
  );
  let output = manager.executor().run(request, log).await?;

  if output.changes.is_empty() {
    info!("schema is up to date, no migration written");
    return Ok(GeneratedMigration {
      version,
      path: None,
      changes: output.changes,
      tables: output.tables,
    });
  }

  let path = store.write(version, name, &output.source)?;
  info!(path = %path.display(), changes = output.changes.len(), "wrote migration");
  Ok(GeneratedMigration {
    version,
    path: Some(path),
    changes: output.changes,
    tables: output.tables,
  })
}
