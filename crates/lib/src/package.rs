//! Package configuration and module resolution.
//!
//! `packages.json` maps package names to directories:
//!
//! ```json
//! { "packages": { "app": "lib/app", "vendor.json": "/opt/lua/json" } }
//! ```
//!
//! Relative directories are resolved against the file's own directory. A
//! module name resolves through the longest package name that is a prefix of
//! it (on `.` boundaries); names matching no package resolve against the
//! project directory itself.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PackageError {
  #[error("failed to read package config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse package config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid package name '{0}'")]
  InvalidName(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PackageFile {
  #[serde(default)]
  packages: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageConfig {
  path: PathBuf,
  root: PathBuf,
  /// Sorted longest name first.
  packages: Vec<(String, PathBuf)>,
}

impl PackageConfig {
  /// Load the package config at `path`. A missing file yields an empty config
  /// rooted at the file's directory.
  pub fn load(path: &Path) -> Result<Self, PackageError> {
    let root = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let file = match fs::read_to_string(path) {
      Ok(content) => serde_json::from_str::<PackageFile>(&content).map_err(|source| PackageError::Parse {
        path: path.to_path_buf(),
        source,
      })?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no package config, using project directory only");
        PackageFile::default()
      }
      Err(source) => {
        return Err(PackageError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let mut packages = Vec::with_capacity(file.packages.len());
    for (name, dir) in file.packages {
      if name.is_empty() || name.split('.').any(str::is_empty) {
        return Err(PackageError::InvalidName(name));
      }
      packages.push((name, root.join(dir)));
    }
    packages.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

    Ok(Self {
      path: path.to_path_buf(),
      root,
      packages,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Directory searched for modules that belong to no package.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Files that may hold `module`, in lookup order.
  pub fn candidates(&self, module: &str) -> Vec<PathBuf> {
    let (base, rest) = self.split(module);
    if rest.is_empty() {
      return vec![base.join("init.lua")];
    }
    let rel = rest.replace('.', "/");
    vec![base.join(format!("{}.lua", rel)), base.join(rel).join("init.lua")]
  }

  /// The first existing candidate file for `module`.
  pub fn resolve(&self, module: &str) -> Option<PathBuf> {
    self.candidates(module).into_iter().find(|p| p.is_file())
  }

  fn split<'a>(&'a self, module: &'a str) -> (&'a Path, &'a str) {
    for (name, dir) in &self.packages {
      if module == name.as_str() {
        return (dir.as_path(), "");
      }
      if let Some(rest) = module.strip_prefix(name.as_str())
        && let Some(rest) = rest.strip_prefix('.')
      {
        return (dir.as_path(), rest);
      }
    }
    (self.root.as_path(), module)
  }
}
