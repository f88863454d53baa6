mod build;
mod clean;
mod migrate;
mod worker;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use conduit_lib::build::{BuildContext, BuildManager};
use conduit_lib::config::{ExecutorConfig, parse_timeout};
use conduit_lib::isolate::IsolateExecutor;

use crate::ProjectArgs;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use migrate::{cmd_migrate_generate, cmd_migrate_schema};
pub use worker::cmd_worker;

/// Executor configuration from the environment, with `--timeout` applied.
fn executor_config(timeout: Option<&str>) -> Result<ExecutorConfig> {
  let mut config = ExecutorConfig::from_env().context("Invalid worker configuration")?;
  if let Some(value) = timeout {
    config.timeout = parse_timeout(value).with_context(|| format!("Invalid --timeout value '{}'", value))?;
  }
  debug!(
    program = %config.worker.program.display(),
    timeout = %config.timeout.map_or_else(|| "none".to_string(), |t| humantime::format_duration(t).to_string()),
    "worker configuration"
  );
  Ok(config)
}

fn build_context(project: &Path, entry: Option<&Path>) -> Result<BuildContext> {
  BuildContext::new(project, entry).with_context(|| format!("Cannot use project {}", project.display()))
}

fn build_manager(args: &ProjectArgs) -> Result<BuildManager> {
  let context = build_context(&args.project, args.entry.as_deref())?;
  let executor = IsolateExecutor::new(executor_config(args.timeout.as_deref())?);
  Ok(BuildManager::new(context, executor))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}
