use std::path::Path;

use anyhow::{Context, Result};

use conduit_lib::build::BuildManager;
use conduit_lib::config::{ExecutorConfig, WorkerCommand};
use conduit_lib::isolate::IsolateExecutor;

use crate::output::{print_info, print_success};

/// Remove the project's build directory. Running it twice is not an error.
pub fn cmd_clean(project: &Path) -> Result<()> {
  let context = super::build_context(project, None)?;
  let build_dir = context.build_directory.clone();
  let existed = build_dir.exists();

  let worker = WorkerCommand::current_exe().context("Cannot locate the conduit executable")?;
  let manager = BuildManager::new(context, IsolateExecutor::new(ExecutorConfig::new(worker)));
  manager.clean().context("Clean failed")?;

  if existed {
    print_success(&format!("Removed {}", build_dir.display()));
  } else {
    print_info("Nothing to clean.");
  }
  Ok(())
}
