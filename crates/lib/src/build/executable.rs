use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::context::BuildContext;
use crate::consts::SCHEMA_SNAPSHOT_FILE;
use crate::isolate::{Executable, ExecutableRequest, ExecuteFailure, WorkerContext};

/// Runs the project's `conduit.on_build` hooks and records the live schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildExecutable {
  /// [`BuildContext::to_map`] of the invoking build.
  pub context: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
  pub hooks_run: usize,
  /// Live table names, in registration order.
  pub tables: Vec<String>,
  pub schema_path: PathBuf,
}

impl Executable for BuildExecutable {
  type Output = BuildReport;
  const KIND: &'static str = "build";

  fn into_request(self) -> ExecutableRequest {
    ExecutableRequest::Build(self)
  }

  fn execute(self, ctx: &WorkerContext) -> Result<BuildReport, ExecuteFailure> {
    let context = BuildContext::from_map(&self.context).map_err(ExecuteFailure::protocol)?;

    let hooks = ctx.build_hooks()?;
    let lua = ctx.lua();
    for hook in &hooks {
      let table = lua.create_table()?;
      for (key, value) in &self.context {
        table.set(key.as_str(), value.as_str())?;
      }
      hook.call::<()>(table)?;
    }

    let schema = ctx.live_schema().map_err(ExecuteFailure::model)?;
    let schema_path = context.build_directory.join(SCHEMA_SNAPSHOT_FILE);
    let json = serde_json::to_string_pretty(&schema).map_err(ExecuteFailure::runtime)?;
    fs::write(&schema_path, json)
      .map_err(|e| ExecuteFailure::runtime(format!("cannot write {}: {}", schema_path.display(), e)))?;

    info!(hooks = hooks.len(), tables = schema.tables.len(), "build hooks complete");
    Ok(BuildReport {
      hooks_run: hooks.len(),
      tables: schema.table_names(),
      schema_path,
    })
  }
}
