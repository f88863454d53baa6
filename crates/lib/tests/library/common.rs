//! Shared helpers for conduit-lib integration tests.

use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;

use conduit_lib::build::{BuildContext, BuildManager};
use conduit_lib::config::{ExecutorConfig, WorkerCommand};
use conduit_lib::consts::{PROTOCOL_VERSION, RESPONSE_PREFIX};
use conduit_lib::isolate::IsolateExecutor;

/// A worker command running `script` under `/bin/sh`.
pub fn shell_worker(script: &str) -> WorkerCommand {
  WorkerCommand::new("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

/// Shell snippet that drains stdin and prints a response carrying `outcome`.
pub fn respond(outcome: &str) -> String {
  respond_with_version(PROTOCOL_VERSION, outcome)
}

pub fn respond_with_version(version: u32, outcome: &str) -> String {
  let line = format!("{}{{\"version\":{},\"outcome\":{}}}", RESPONSE_PREFIX, version, outcome);
  format!("cat > /dev/null; printf '%s\\n' '{}'", line.replace('\'', r"'\''"))
}

pub fn executor(script: &str, timeout: Duration) -> IsolateExecutor {
  IsolateExecutor::new(ExecutorConfig::new(shell_worker(script)).with_timeout(Some(timeout)))
}

/// A temporary project directory.
pub struct Project {
  pub temp: TempDir,
}

impl Project {
  /// A project with `packages.json` and the given entry script.
  pub fn with_entry(entry: &str) -> Self {
    let project = Self::empty();
    project.write("packages.json", r#"{ "packages": { "app": "src" } }"#);
    project.write("bin/main.lua", entry);
    project
  }

  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the project root.
  pub fn write(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn context(&self) -> BuildContext {
    BuildContext::new(self.path(), None).unwrap()
  }

  /// A manager whose worker is never expected to run.
  pub fn manager(&self) -> BuildManager {
    BuildManager::new(self.context(), executor("exit 97", Duration::from_secs(5)))
  }
}

/// Entry script registering `users` and `teams` models from a package.
pub const APP_ENTRY: &str = r#"
local conduit = require("conduit")
require("app.models")

conduit.on_build(function(ctx)
  conduit.log("building " .. ctx.build_directory)
end)

function main(args)
  error("main must not run during a build")
end
"#;

pub const APP_MODELS: &str = r#"
local conduit = require("conduit")

conduit.model("Team", {
  table = "teams",
  columns = {
    { name = "id", type = "big_integer", primary_key = true, autoincrement = true },
    { name = "name", type = "string", unique = true },
  },
})

conduit.model("User", {
  table = "users",
  columns = {
    { name = "id", type = "big_integer", primary_key = true, autoincrement = true },
    { name = "email", type = "string", unique = true, indexed = true },
  },
  belongs_to = {
    { name = "team", model = "Team", nullable = true, on_delete = "cascade" },
  },
})
"#;

/// A project using [`APP_ENTRY`] and [`APP_MODELS`].
pub fn app_project() -> Project {
  let project = Project::with_entry(APP_ENTRY);
  project.write("src/models.lua", APP_MODELS);
  project
}
