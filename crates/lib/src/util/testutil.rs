//! Test helpers for conduit-lib.
//!
//! Shell-script stand-ins for the worker binary and small project fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::WorkerCommand;
use crate::consts::PACKAGE_CONFIG_FILE;

/// A worker command that runs `script` under `/bin/sh`.
#[cfg(unix)]
pub fn shell_worker(script: &str) -> WorkerCommand {
  WorkerCommand::new("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_worker(script: &str) -> WorkerCommand {
  WorkerCommand::new("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Write `files` (relative path, content) under `root` and return the root.
pub fn write_project(root: &Path, files: &[(&str, &str)]) -> PathBuf {
  for (rel, content) in files {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }
  if !root.join(PACKAGE_CONFIG_FILE).exists() {
    fs::write(root.join(PACKAGE_CONFIG_FILE), r#"{ "packages": {} }"#).unwrap();
  }
  root.to_path_buf()
}
