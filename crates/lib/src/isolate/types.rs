use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::executable::ExecutableRequest;
use crate::consts::PROTOCOL_VERSION;

/// Failure class for an invalid input schema or an unsupported diff.
pub const SCHEMA_ERROR: &str = "SchemaError";
/// Failure class for a live schema the model registry cannot produce.
pub const MODEL_ERROR: &str = "ModelError";
/// Failure class for errors raised by project code.
pub const RUNTIME_ERROR: &str = "RuntimeError";
/// Failure class for imports that cannot be verified or loaded.
pub const IMPORT_ERROR: &str = "ImportError";
/// Failure class for malformed or incompatible requests.
pub const PROTOCOL_ERROR: &str = "ProtocolError";

/// Something the worker loads before the executable runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Import {
  /// A dotted module name, loaded with `require`.
  Module { name: String },
  /// An absolute file path, loaded with `dofile`. When `sha256` is set the
  /// worker refuses to load a file with a different digest.
  File {
    path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
  },
}

impl Import {
  pub fn module(name: impl Into<String>) -> Self {
    Import::Module { name: name.into() }
  }

  pub fn file(path: impl Into<PathBuf>) -> Self {
    Import::File {
      path: path.into(),
      sha256: None,
    }
  }

  pub fn pinned(path: impl Into<PathBuf>, sha256: impl Into<String>) -> Self {
    Import::File {
      path: path.into(),
      sha256: Some(sha256.into()),
    }
  }
}

/// A typed request to run executable `E` in a worker.
#[derive(Debug, Clone)]
pub struct IsolateRequest<E> {
  pub executable: E,
  pub package_config: PathBuf,
  /// Loaded in order; duplicates are kept.
  pub imports: Vec<Import>,
}

impl<E> IsolateRequest<E> {
  pub fn new(executable: E, package_config: impl Into<PathBuf>, imports: Vec<Import>) -> Self {
    Self {
      executable,
      package_config: package_config.into(),
      imports,
    }
  }
}

/// The envelope written to a worker's stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
  pub version: u32,
  pub package_config: PathBuf,
  /// The synthesized entry script.
  pub entry: PathBuf,
  pub imports: Vec<Import>,
  pub executable: ExecutableRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
  Success { payload: serde_json::Value },
  Failure { class: String, message: String },
}

/// The envelope a worker writes as its single response line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResponse {
  pub version: u32,
  pub outcome: Outcome,
}

impl WorkerResponse {
  pub fn success(payload: serde_json::Value) -> Self {
    Self {
      version: PROTOCOL_VERSION,
      outcome: Outcome::Success { payload },
    }
  }

  pub fn failure(failure: ExecuteFailure) -> Self {
    Self {
      version: PROTOCOL_VERSION,
      outcome: Outcome::Failure {
        class: failure.class,
        message: failure.message,
      },
    }
  }
}

/// A classified failure inside the worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{class}: {message}")]
pub struct ExecuteFailure {
  pub class: String,
  pub message: String,
}

impl ExecuteFailure {
  pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      class: class.into(),
      message: message.into(),
    }
  }

  pub fn schema(message: impl ToString) -> Self {
    Self::new(SCHEMA_ERROR, message.to_string())
  }

  pub fn model(message: impl ToString) -> Self {
    Self::new(MODEL_ERROR, message.to_string())
  }

  pub fn runtime(message: impl ToString) -> Self {
    Self::new(RUNTIME_ERROR, message.to_string())
  }

  pub fn import(message: impl ToString) -> Self {
    Self::new(IMPORT_ERROR, message.to_string())
  }

  pub fn protocol(message: impl ToString) -> Self {
    Self::new(PROTOCOL_ERROR, message.to_string())
  }
}

impl From<mlua::Error> for ExecuteFailure {
  fn from(err: mlua::Error) -> Self {
    ExecuteFailure::runtime(crate::lua::error_summary(&err))
  }
}

/// Errors returned by [`IsolateExecutor::run`](super::IsolateExecutor::run).
#[derive(Debug, Error)]
pub enum IsolateError {
  #[error("failed to serialize worker request: {0}")]
  Serialize(#[source] serde_json::Error),

  /// The worker rejected a schema (class `SchemaError`).
  #[error("schema error: {0}")]
  Schema(String),

  /// The worker could not build the live schema (class `ModelError`).
  #[error("model error: {0}")]
  Model(String),

  #[error(transparent)]
  Execution(#[from] IsolateExecutionError),
}

/// Failures of the isolation machinery itself.
#[derive(Debug, Error)]
pub enum IsolateExecutionError {
  #[error("failed to spawn worker {program}: {source}")]
  Spawn {
    program: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("worker timed out after {0:?}")]
  Timeout(Duration),

  #[error("worker exited without a response ({status})")]
  Crashed { status: ExitStatus },

  #[error("malformed worker response: {0}")]
  MalformedResponse(String),

  #[error("worker speaks protocol version {actual}, expected {expected}")]
  VersionMismatch { expected: u32, actual: u32 },

  #[error("{class}: {message}")]
  Unhandled { class: String, message: String },

  #[error("worker I/O failed: {0}")]
  Io(#[from] std::io::Error),
}
