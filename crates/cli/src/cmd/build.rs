//! Implementation of the `conduit build` command.
//!
//! Stages the entry script without its `main` function and runs the
//! project's build hooks in a worker process.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use crate::ProjectArgs;
use crate::output::{OutputFormat, format_duration, print_diagnostic, print_json, print_stat, print_success};

/// Execute the build command.
///
/// Worker diagnostics are forwarded to stderr as they arrive. Prints the
/// hook count, the live tables and the schema snapshot path.
pub fn cmd_build(args: &ProjectArgs, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let manager = super::build_manager(args)?;

  let mut forward = |line: &str| print_diagnostic(line);
  let report = super::runtime()?
    .block_on(manager.build(Some(&mut forward)))
    .context("Build failed")?;
  info!(hooks = report.hooks_run, tables = report.tables.len(), "build finished");

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_success("Build complete!");
    print_stat("Hooks run", &report.hooks_run.to_string());
    print_stat("Tables", &report.tables.join(", "));
    print_stat("Schema", &report.schema_path.display().to_string());
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  Ok(())
}
