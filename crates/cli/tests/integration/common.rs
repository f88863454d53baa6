//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture directory.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

fn copy_dir(from: &Path, to: &Path) {
  std::fs::create_dir_all(to).unwrap();
  for entry in std::fs::read_dir(from).unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", from.display(), e)) {
    let entry = entry.unwrap();
    let target = to.join(entry.file_name());
    if entry.file_type().unwrap().is_dir() {
      copy_dir(&entry.path(), &target);
    } else {
      std::fs::copy(entry.path(), &target).unwrap();
    }
  }
}

/// Isolated test environment.
///
/// Each test gets its own temporary project directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create from a fixture project directory.
  pub fn from_fixture(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    copy_dir(&fixture_path(name), temp.path());
    Self { temp }
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(relative_path)).unwrap()
  }

  /// Project root.
  pub fn project_path(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  pub fn build_dir(&self) -> PathBuf {
    self.project_path().join("build")
  }

  /// Migration files currently on disk, sorted by name.
  pub fn migrations(&self) -> Vec<String> {
    let dir = self.project_path().join("migrations");
    let Ok(entries) = std::fs::read_dir(dir) else {
      return Vec::new();
    };
    let mut names: Vec<String> = entries
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    names.sort();
    names
  }

  /// Get a pre-configured Command for the conduit binary.
  ///
  /// The binary is its own worker; `CONDUIT_WORKER_PROGRAM` is cleared so
  /// the host environment cannot redirect it.
  pub fn conduit_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("conduit");
    cmd.env_remove("CONDUIT_WORKER_PROGRAM");
    cmd.env_remove("CONDUIT_WORKER_TIMEOUT");
    cmd.env_remove("CONDUIT_LOG");
    cmd
  }

  /// `conduit <subcommand...> --project <root>`
  pub fn run(&self, args: &[&str]) -> Command {
    let mut cmd = self.conduit_cmd();
    cmd.args(args).arg("--project").arg(self.project_path());
    cmd
  }
}
