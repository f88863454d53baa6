//! The unit of work a worker runs.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::context::WorkerContext;
use super::types::ExecuteFailure;
use crate::build::BuildExecutable;
use crate::lua::globals::EXECUTABLE_MODULE_PREFIX;
use crate::migration::MigrationDiffExecutable;

/// A payload executed inside a worker.
///
/// The outer process constructs the executable, converts it with
/// [`into_request`](Executable::into_request) and decodes the worker's
/// payload as [`Output`](Executable::Output). The worker side calls
/// [`execute`](Executable::execute) with the runtime that has the project's
/// code loaded.
pub trait Executable: Sized {
  type Output: Serialize + DeserializeOwned;

  /// Wire tag of the request, also naming the defining module.
  const KIND: &'static str;

  fn into_request(self) -> ExecutableRequest;

  fn execute(self, ctx: &WorkerContext) -> Result<Self::Output, ExecuteFailure>;

  /// Module the synthesized entry imports after the project's imports.
  fn module() -> String {
    format!("{}{}", EXECUTABLE_MODULE_PREFIX, Self::KIND)
  }
}

/// Every executable the worker knows how to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutableRequest {
  Build(BuildExecutable),
  MigrationDiff(MigrationDiffExecutable),
}

impl ExecutableRequest {
  pub const KINDS: &'static [&'static str] = &[BuildExecutable::KIND, MigrationDiffExecutable::KIND];

  pub fn kind(&self) -> &'static str {
    match self {
      ExecutableRequest::Build(_) => BuildExecutable::KIND,
      ExecutableRequest::MigrationDiff(_) => MigrationDiffExecutable::KIND,
    }
  }

  pub fn module(&self) -> String {
    format!("{}{}", EXECUTABLE_MODULE_PREFIX, self.kind())
  }

  /// Run the executable and serialize its output.
  pub fn execute(self, ctx: &WorkerContext) -> Result<serde_json::Value, ExecuteFailure> {
    match self {
      ExecutableRequest::Build(exe) => to_payload(exe.execute(ctx)?),
      ExecutableRequest::MigrationDiff(exe) => to_payload(exe.execute(ctx)?),
    }
  }
}

fn to_payload<T: Serialize>(output: T) -> Result<serde_json::Value, ExecuteFailure> {
  serde_json::to_value(output).map_err(|e| ExecuteFailure::protocol(format!("cannot serialize output: {}", e)))
}
