use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::context::BuildContext;
use super::executable::{BuildExecutable, BuildReport};
use crate::isolate::{Import, IsolateError, IsolateExecutor, IsolateRequest, LogHandler};
use crate::source::{ParseError, SourceAnalyzer, TransformError, stage};
use crate::util::hash::hash_bytes;

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error(transparent)]
  Transform(#[from] TransformError),

  #[error("failed to create build directory {path}: {source}")]
  BuildDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to remove build directory {path}: {source}")]
  Clean {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Isolate(#[from] IsolateError),
}

/// The main-stripped copy of the entry script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedScript {
  pub path: PathBuf,
  /// Number of `main` declarations removed.
  pub removed: usize,
  pub sha256: String,
}

/// Drives staging and worker execution for one project.
///
/// Builds on the same project directory must not overlap; the manager does
/// no locking of its own.
#[derive(Debug, Clone)]
pub struct BuildManager {
  context: BuildContext,
  executor: IsolateExecutor,
}

impl BuildManager {
  pub fn new(context: BuildContext, executor: IsolateExecutor) -> Self {
    Self { context, executor }
  }

  pub fn context(&self) -> &BuildContext {
    &self.context
  }

  pub fn executor(&self) -> &IsolateExecutor {
    &self.executor
  }

  /// Stage the entry script with every top-level `main` removed.
  ///
  /// Nothing is written to the target when analysis or the transform fails.
  pub fn prepare(&self) -> Result<StagedScript, BuildError> {
    let build_dir = &self.context.build_directory;
    fs::create_dir_all(build_dir).map_err(|source| BuildError::BuildDir {
      path: build_dir.clone(),
      source,
    })?;

    let mut analyzer = SourceAnalyzer::new()?;
    let unit = analyzer.analyze_file(&self.context.source_entry_file)?;
    let ranges: Vec<_> = unit.main_declarations().iter().map(|d| d.range).collect();
    if ranges.is_empty() {
      warn!(entry = %self.context.source_entry_file.display(), "entry script declares no main function");
    }

    let staged = stage(unit.source(), &ranges, &self.context.target_script_file)?;
    let script = StagedScript {
      path: self.context.target_script_file.clone(),
      removed: ranges.len(),
      sha256: hash_bytes(staged.as_bytes()),
    };
    info!(
      path = %script.path.display(),
      removed = script.removed,
      sha256 = %script.sha256,
      "staged entry script"
    );
    Ok(script)
  }

  /// Imports that make the project's code visible to a worker.
  pub fn imports(&self, staged: &StagedScript) -> Vec<Import> {
    vec![Import::pinned(staged.path.clone(), staged.sha256.clone())]
  }

  /// Stage the entry script and run the project's build hooks in a worker.
  pub async fn build(&self, log: Option<LogHandler<'_>>) -> Result<BuildReport, BuildError> {
    let staged = self.prepare()?;
    let request = IsolateRequest::new(
      BuildExecutable {
        context: self.context.to_map(),
      },
      self.context.package_config.clone(),
      self.imports(&staged),
    );
    let report = self.executor.run(request, log).await?;
    info!(hooks = report.hooks_run, tables = report.tables.len(), "build complete");
    Ok(report)
  }

  /// Remove the build directory and everything in it.
  pub fn clean(&self) -> Result<(), BuildError> {
    let build_dir = &self.context.build_directory;
    match fs::remove_dir_all(build_dir) {
      Ok(()) => {
        info!(path = %build_dir.display(), "removed build directory");
        Ok(())
      }
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(path = %build_dir.display(), "build directory already absent");
        Ok(())
      }
      Err(source) => Err(BuildError::Clean {
        path: build_dir.clone(),
        source,
      }),
    }
  }
}
