//! The worker side of the isolation protocol.
//!
//! A worker reads exactly one [`WorkerRequest`] from stdin, verifies its
//! imports, evaluates the synthesized entry script in a fresh runtime, runs
//! the executable and writes exactly one response line to stdout. Every
//! failure, including a request it cannot decode, becomes a failure response.

use std::io::{BufRead, Write};

use tracing::{debug, info};

use super::context::WorkerContext;
use super::types::{ExecuteFailure, Import, WorkerRequest, WorkerResponse};
use crate::consts::{PROTOCOL_VERSION, RESPONSE_PREFIX};
use crate::lua::loaders::load_file;
use crate::package::PackageConfig;
use crate::util::hash::verify_file;

/// Serve one request from `input`, writing the response line to `output`.
pub fn serve<R: BufRead, W: Write>(mut input: R, mut output: W) -> std::io::Result<()> {
  let mut message = String::new();
  input.read_to_string(&mut message)?;

  let response = handle_message(&message);
  let line = serde_json::to_string(&response).map_err(std::io::Error::other)?;
  writeln!(output, "{}{}", RESPONSE_PREFIX, line)?;
  output.flush()
}

/// Decode a raw request and handle it.
pub fn handle_message(message: &str) -> WorkerResponse {
  let request = match decode(message) {
    Ok(request) => request,
    Err(failure) => return WorkerResponse::failure(failure),
  };
  handle_request(request)
}

pub fn handle_request(request: WorkerRequest) -> WorkerResponse {
  match execute(request) {
    Ok(payload) => WorkerResponse::success(payload),
    Err(failure) => {
      debug!(class = %failure.class, message = %failure.message, "request failed");
      WorkerResponse::failure(failure)
    }
  }
}

fn decode(message: &str) -> Result<WorkerRequest, ExecuteFailure> {
  let value: serde_json::Value =
    serde_json::from_str(message).map_err(|e| ExecuteFailure::protocol(format!("cannot decode request: {}", e)))?;

  let version = value.get("version").and_then(serde_json::Value::as_u64);
  if version != Some(u64::from(PROTOCOL_VERSION)) {
    return Err(ExecuteFailure::protocol(format!(
      "unsupported protocol version {}, expected {}",
      version.map_or_else(|| "none".to_string(), |v| v.to_string()),
      PROTOCOL_VERSION
    )));
  }

  serde_json::from_value(value).map_err(|e| ExecuteFailure::protocol(format!("invalid request: {}", e)))
}

fn execute(request: WorkerRequest) -> Result<serde_json::Value, ExecuteFailure> {
  verify_imports(&request.imports)?;

  let packages = PackageConfig::load(&request.package_config).map_err(ExecuteFailure::import)?;
  let ctx = WorkerContext::new(packages)?;

  let module = request.executable.module();
  info!(kind = request.executable.kind(), entry = %request.entry.display(), "executing request");

  load_file(ctx.lua(), &request.entry)?;
  if !ctx.is_loaded(&module)? {
    return Err(ExecuteFailure::protocol(format!(
      "entry script did not load executable module '{}'",
      module
    )));
  }

  request.executable.execute(&ctx)
}

/// Check pinned digests before any project code runs.
fn verify_imports(imports: &[Import]) -> Result<(), ExecuteFailure> {
  for import in imports {
    match import {
      Import::File { path, sha256 } => {
        if !path.is_absolute() {
          return Err(ExecuteFailure::import(format!(
            "file import '{}' is not an absolute path",
            path.display()
          )));
        }
        if let Some(expected) = sha256 {
          verify_file(path, expected).map_err(ExecuteFailure::import)?;
        }
      }
      Import::Module { name } => {
        if name.is_empty() || name.split('.').any(str::is_empty) {
          return Err(ExecuteFailure::import(format!("invalid module name '{}'", name)));
        }
      }
    }
  }
  Ok(())
}
