//! Executor configuration.
//!
//! Defaults come from the running binary and [`DEFAULT_WORKER_TIMEOUT_SECS`];
//! the environment can override them:
//!
//! - `CONDUIT_WORKER_PROGRAM`: path to the executable spawned as the worker
//! - `CONDUIT_WORKER_TIMEOUT`: a duration such as `30s` or `2m`; `0` or `none`
//!   disables the bound

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::consts::{DEFAULT_WORKER_TIMEOUT_SECS, ENV_WORKER_PROGRAM, ENV_WORKER_TIMEOUT, WORKER_SUBCOMMAND};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("cannot locate the current executable: {0}")]
  CurrentExe(#[source] std::io::Error),

  #[error("invalid {var} value '{value}': {source}")]
  InvalidTimeout {
    var: &'static str,
    value: String,
    #[source]
    source: humantime::DurationError,
  },
}

/// The program (and arguments) spawned for each isolated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
  pub program: PathBuf,
  pub args: Vec<String>,
}

impl WorkerCommand {
  pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
    Self {
      program: program.into(),
      args,
    }
  }

  /// `<program> worker`
  pub fn conduit(program: impl Into<PathBuf>) -> Self {
    Self::new(program, vec![WORKER_SUBCOMMAND.to_string()])
  }

  /// The running executable in worker mode.
  pub fn current_exe() -> Result<Self, ConfigError> {
    let exe = std::env::current_exe().map_err(ConfigError::CurrentExe)?;
    Ok(Self::conduit(exe))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
  pub worker: WorkerCommand,
  /// `None` lets a worker run indefinitely.
  pub timeout: Option<Duration>,
}

impl ExecutorConfig {
  pub fn new(worker: WorkerCommand) -> Self {
    Self {
      worker,
      timeout: Some(Duration::from_secs(DEFAULT_WORKER_TIMEOUT_SECS)),
    }
  }

  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  /// Build a configuration from the environment, falling back to the running
  /// executable and the default timeout.
  pub fn from_env() -> Result<Self, ConfigError> {
    let worker = match std::env::var_os(ENV_WORKER_PROGRAM) {
      Some(program) if !program.is_empty() => WorkerCommand::conduit(program),
      _ => WorkerCommand::current_exe()?,
    };

    let mut config = Self::new(worker);
    if let Ok(value) = std::env::var(ENV_WORKER_TIMEOUT) {
      config.timeout = parse_timeout(&value).map_err(|source| ConfigError::InvalidTimeout {
        var: ENV_WORKER_TIMEOUT,
        value: value.clone(),
        source,
      })?;
    }
    Ok(config)
  }
}

/// Parse a timeout setting. `0` and `none` mean no timeout.
pub fn parse_timeout(value: &str) -> Result<Option<Duration>, humantime::DurationError> {
  let value = value.trim();
  if value == "0" || value.eq_ignore_ascii_case("none") {
    return Ok(None);
  }
  let duration = humantime::parse_duration(value)?;
  Ok((!duration.is_zero()).then_some(duration))
}
