use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::MigrationError;
use crate::consts::MIGRATIONS_DIR_NAME;

const MIGRATION_SUFFIX: &str = ".migration.lua";

/// A migration file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
  pub version: u32,
  pub name: String,
  pub path: PathBuf,
}

impl MigrationFile {
  /// Parse `00000003_add_users.migration.lua` into its version and name.
  pub fn parse(path: &Path) -> Option<Self> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(MIGRATION_SUFFIX)?;
    let (version, name) = stem.split_once('_')?;
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) || !is_valid_name(name) {
      return None;
    }
    Some(Self {
      version: version.parse().ok()?,
      name: name.to_string(),
      path: path.to_path_buf(),
    })
  }

  pub fn file_name(version: u32, name: &str) -> String {
    format!("{:08}_{}{}", version, name, MIGRATION_SUFFIX)
  }
}

/// Migration names are non-empty and use lowercase letters, digits and `_`.
pub fn is_valid_name(name: &str) -> bool {
  !name.is_empty()
    && name
      .bytes()
      .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// The `migrations/` directory of a project.
#[derive(Debug, Clone)]
pub struct MigrationStore {
  dir: PathBuf,
}

impl MigrationStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn for_project(project_dir: &Path) -> Self {
    Self::new(project_dir.join(MIGRATIONS_DIR_NAME))
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Every migration in the directory, ordered by version.
  ///
  /// A missing directory holds no migrations. Files whose names do not parse
  /// are skipped with a warning; two files with the same version are an error.
  pub fn list(&self) -> Result<Vec<MigrationFile>, MigrationError> {
    if !self.dir.exists() {
      debug!(dir = %self.dir.display(), "no migrations directory");
      return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1).sort_by_file_name() {
      let entry = entry.map_err(|source| MigrationError::Discover {
        dir: self.dir.clone(),
        source,
      })?;
      if !entry.file_type().is_file() {
        continue;
      }
      match MigrationFile::parse(entry.path()) {
        Some(file) => files.push(file),
        None => warn!(path = %entry.path().display(), "skipping file with an invalid migration name"),
      }
    }

    files.sort_by_key(|f| f.version);
    for pair in files.windows(2) {
      if pair[0].version == pair[1].version {
        return Err(MigrationError::DuplicateVersion {
          version: pair[0].version,
          first: pair[0].path.clone(),
          second: pair[1].path.clone(),
        });
      }
    }
    Ok(files)
  }

  /// One past the latest version, or 1 for an empty directory.
  pub fn next_version(&self) -> Result<u32, MigrationError> {
    next_version_of(&self.list()?)
  }

  /// Write a new migration file. Existing files are never overwritten.
  pub fn write(&self, version: u32, name: &str, source: &str) -> Result<PathBuf, MigrationError> {
    if !is_valid_name(name) {
      return Err(MigrationError::InvalidName(name.to_string()));
    }
    fs::create_dir_all(&self.dir).map_err(|source| MigrationError::Write {
      path: self.dir.clone(),
      source,
    })?;

    let path = self.dir.join(MigrationFile::file_name(version, name));
    if path.exists() {
      return Err(MigrationError::Exists(path));
    }
    fs::write(&path, source).map_err(|source| MigrationError::Write {
      path: path.clone(),
      source,
    })?;
    Ok(path)
  }
}

pub(crate) fn next_version_of(files: &[MigrationFile]) -> Result<u32, MigrationError> {
  match files.last() {
    Some(last) => last
      .version
      .checked_add(1)
      .ok_or_else(|| MigrationError::VersionExhausted(last.path.clone())),
    None => Ok(1),
  }
}
