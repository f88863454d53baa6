//! Running executables in a worker process.

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::entry;
use super::executable::Executable;
use super::types::{
  IsolateError, IsolateExecutionError, IsolateRequest, MODEL_ERROR, Outcome, SCHEMA_ERROR, WorkerRequest, WorkerResponse,
};
use crate::config::ExecutorConfig;
use crate::consts::{PROTOCOL_VERSION, RESPONSE_PREFIX};

/// Receives each worker stderr line, in emission order.
pub type LogHandler<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Runs executables in freshly spawned worker processes.
///
/// Every call to [`run`](Self::run) spawns one worker, sends it one request and
/// waits for its single response. The worker is reaped or killed before
/// `run` returns.
#[derive(Debug, Clone)]
pub struct IsolateExecutor {
  config: ExecutorConfig,
}

impl IsolateExecutor {
  pub fn new(config: ExecutorConfig) -> Self {
    Self { config }
  }

  pub async fn run<E: Executable>(
    &self,
    request: IsolateRequest<E>,
    mut log: Option<LogHandler<'_>>,
  ) -> Result<E::Output, IsolateError> {
    let entry_dir = tempfile::Builder::new()
      .prefix("conduit-isolate-")
      .tempdir()
      .map_err(IsolateExecutionError::Io)?;
    let module = E::module();
    let entry_path = entry_dir.path().join(entry::ENTRY_FILE_NAME);

    let envelope = WorkerRequest {
      version: PROTOCOL_VERSION,
      package_config: request.package_config,
      entry: entry_path,
      imports: request.imports,
      executable: request.executable.into_request(),
    };
    let mut payload = serde_json::to_vec(&envelope).map_err(IsolateError::Serialize)?;
    payload.push(b'\n');

    entry::write_entry(entry_dir.path(), &envelope.imports, &module).map_err(IsolateExecutionError::Io)?;

    let workdir = envelope.package_config.parent().unwrap_or(Path::new("."));
    let worker = &self.config.worker;
    let mut child = Command::new(&worker.program)
      .args(&worker.args)
      .current_dir(workdir)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .map_err(|source| IsolateExecutionError::Spawn {
        program: worker.program.clone(),
        source,
      })?;

    info!(
      kind = envelope.executable.kind(),
      program = %worker.program.display(),
      imports = envelope.imports.len(),
      "spawned worker"
    );

    let exchange = exchange(&mut child, &payload, log.as_deref_mut());
    let result = match self.config.timeout {
      Some(bound) => tokio::time::timeout(bound, exchange).await.ok(),
      None => Some(exchange.await),
    };

    let (line, status) = match result {
      Some(result) => result.map_err(IsolateExecutionError::Io)?,
      None => {
        let bound = self.config.timeout.unwrap_or_default();
        warn!(timeout = ?bound, "worker timed out, killing it");
        if let Err(e) = child.kill().await {
          debug!(error = %e, "failed to kill timed out worker");
        }
        return Err(IsolateExecutionError::Timeout(bound).into());
      }
    };

    debug!(status = %status, "worker exited");
    let response = match line {
      Some(line) => parse_response(&line)?,
      None => return Err(IsolateExecutionError::Crashed { status }.into()),
    };
    decode_outcome::<E::Output>(response.outcome)
  }
}

/// Send the request and collect the response line, forwarding diagnostics.
async fn exchange<'a>(
  child: &mut Child,
  payload: &[u8],
  mut log: Option<&mut (dyn FnMut(&str) + Send + 'a)>,
) -> std::io::Result<(Option<String>, ExitStatus)> {
  if let Some(mut stdin) = child.stdin.take() {
    // A worker that dies before reading its request surfaces as Crashed.
    if let Err(e) = stdin.write_all(payload).await {
      debug!(error = %e, "failed to write worker request");
    }
    drop(stdin);
  }

  let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
  let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;
  let mut out_lines = BufReader::new(stdout).lines();
  let mut err_lines = BufReader::new(stderr).lines();
  let (mut out_done, mut err_done) = (false, false);
  let mut response = None;

  while !(out_done && err_done) {
    tokio::select! {
      line = out_lines.next_line(), if !out_done => match line? {
        Some(line) => match line.strip_prefix(RESPONSE_PREFIX) {
          Some(body) if response.is_none() => response = Some(body.to_string()),
          Some(_) => warn!("worker sent more than one response, keeping the first"),
          None => debug!(line = %line, "worker stdout"),
        },
        None => out_done = true,
      },
      line = err_lines.next_line(), if !err_done => match line? {
        Some(line) => match log.as_deref_mut() {
          Some(handler) => handler(&line),
          None => info!(target: "conduit::worker", "{}", line),
        },
        None => err_done = true,
      },
    }
  }

  let status = child.wait().await?;
  Ok((response, status))
}

fn missing_pipe(name: &str) -> std::io::Error {
  std::io::Error::other(format!("worker {} was not captured", name))
}

fn parse_response(line: &str) -> Result<WorkerResponse, IsolateExecutionError> {
  let value: serde_json::Value =
    serde_json::from_str(line).map_err(|e| IsolateExecutionError::MalformedResponse(e.to_string()))?;

  let version = value
    .get("version")
    .and_then(serde_json::Value::as_u64)
    .ok_or_else(|| IsolateExecutionError::MalformedResponse("missing protocol version".into()))?;
  if version != u64::from(PROTOCOL_VERSION) {
    return Err(IsolateExecutionError::VersionMismatch {
      expected: PROTOCOL_VERSION,
      actual: u32::try_from(version).unwrap_or(u32::MAX),
    });
  }

  serde_json::from_value(value).map_err(|e| IsolateExecutionError::MalformedResponse(e.to_string()))
}

fn decode_outcome<T: DeserializeOwned>(outcome: Outcome) -> Result<T, IsolateError> {
  match outcome {
    Outcome::Success { payload } => serde_json::from_value(payload)
      .map_err(|e| IsolateExecutionError::MalformedResponse(format!("unexpected payload: {}", e)).into()),
    Outcome::Failure { class, message } => Err(match class.as_str() {
      SCHEMA_ERROR => IsolateError::Schema(message),
      MODEL_ERROR => IsolateError::Model(message),
      _ => IsolateExecutionError::Unhandled { class, message }.into(),
    }),
  }
}
