use serde::{Deserialize, Serialize};
use tracing::info;

use super::source::render;
use crate::isolate::{Executable, ExecutableRequest, ExecuteFailure, WorkerContext};
use crate::schema::{Schema, SchemaDiff};

/// Compares a schema against the live model registry and generates the
/// migration between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationDiffExecutable {
  /// The schema the existing migrations describe.
  pub input_schema: Schema,
  /// Version recorded in the generated source.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationDiffOutput {
  /// Lua source of the generated migration.
  pub source: String,
  /// One description per change, in emission order.
  pub changes: Vec<String>,
  /// Live table names considered by the diff.
  pub tables: Vec<String>,
}

impl Executable for MigrationDiffExecutable {
  type Output = MigrationDiffOutput;
  const KIND: &'static str = "migration_diff";

  fn into_request(self) -> ExecutableRequest {
    ExecutableRequest::MigrationDiff(self)
  }

  fn execute(self, ctx: &WorkerContext) -> Result<MigrationDiffOutput, ExecuteFailure> {
    self.input_schema.validate().map_err(ExecuteFailure::schema)?;
    let live = ctx.live_schema().map_err(ExecuteFailure::model)?;
    let diff = SchemaDiff::between(&self.input_schema, &live).map_err(ExecuteFailure::schema)?;

    info!(changes = diff.len(), tables = live.tables.len(), "computed schema diff");
    Ok(MigrationDiffOutput {
      source: render(&diff, self.version),
      changes: diff.descriptions(),
      tables: live.table_names(),
    })
  }
}
