use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{BUILD_DIR_NAME, DEFAULT_ENTRY_FILE, PACKAGE_CONFIG_FILE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
  #[error("missing build context key '{0}'")]
  MissingKey(&'static str),

  #[error("project directory {path} is not accessible: {message}")]
  Project { path: PathBuf, message: String },

  #[error("entry file {0} has no file name")]
  InvalidEntry(PathBuf),
}

/// Where the pipeline reads from and writes to for one invocation.
///
/// All paths are absolute. The context is immutable once built and crosses
/// the process boundary as a flat string map ([`to_map`](Self::to_map)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
  pub source_application_directory: PathBuf,
  pub source_entry_file: PathBuf,
  pub build_directory: PathBuf,
  pub target_script_file: PathBuf,
  pub package_config: PathBuf,
}

const KEY_APPLICATION_DIRECTORY: &str = "source_application_directory";
const KEY_ENTRY_FILE: &str = "source_entry_file";
const KEY_BUILD_DIRECTORY: &str = "build_directory";
const KEY_TARGET_SCRIPT: &str = "target_script_file";
const KEY_PACKAGE_CONFIG: &str = "package_config";

impl BuildContext {
  /// Derive a context for the project at `project_dir`.
  ///
  /// `entry` is resolved against the project directory and defaults to
  /// `bin/main.lua`. The staged script keeps the entry's file name.
  pub fn new(project_dir: &Path, entry: Option<&Path>) -> Result<Self, ContextError> {
    let root = dunce::canonicalize(project_dir).map_err(|e| ContextError::Project {
      path: project_dir.to_path_buf(),
      message: e.to_string(),
    })?;

    let entry = root.join(entry.unwrap_or(Path::new(DEFAULT_ENTRY_FILE)));
    let file_name = entry
      .file_name()
      .ok_or_else(|| ContextError::InvalidEntry(entry.clone()))?
      .to_owned();
    let build_directory = root.join(BUILD_DIR_NAME);

    Ok(Self {
      source_entry_file: entry,
      target_script_file: build_directory.join(file_name),
      build_directory,
      package_config: root.join(PACKAGE_CONFIG_FILE),
      source_application_directory: root,
    })
  }

  pub fn to_map(&self) -> BTreeMap<String, String> {
    let entries = [
      (KEY_APPLICATION_DIRECTORY, &self.source_application_directory),
      (KEY_ENTRY_FILE, &self.source_entry_file),
      (KEY_BUILD_DIRECTORY, &self.build_directory),
      (KEY_TARGET_SCRIPT, &self.target_script_file),
      (KEY_PACKAGE_CONFIG, &self.package_config),
    ];
    entries
      .into_iter()
      .map(|(key, path)| (key.to_string(), path.to_string_lossy().into_owned()))
      .collect()
  }

  pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, ContextError> {
    let get = |key: &'static str| {
      map
        .get(key)
        .map(PathBuf::from)
        .ok_or(ContextError::MissingKey(key))
    };
    Ok(Self {
      source_application_directory: get(KEY_APPLICATION_DIRECTORY)?,
      source_entry_file: get(KEY_ENTRY_FILE)?,
      build_directory: get(KEY_BUILD_DIRECTORY)?,
      target_script_file: get(KEY_TARGET_SCRIPT)?,
      package_config: get(KEY_PACKAGE_CONFIG)?,
    })
  }
}
