//! The hidden `conduit worker` command.
//!
//! Reads one request from stdin and writes one response line to stdout.
//! Logs go to stderr, where the parent forwards them as diagnostics.

use anyhow::{Context, Result};

use conduit_lib::isolate::worker;

pub fn cmd_worker() -> Result<()> {
  let stdin = std::io::stdin();
  let stdout = std::io::stdout();
  worker::serve(stdin.lock(), stdout.lock()).context("Failed to serve worker request")
}
