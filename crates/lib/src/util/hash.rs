//! SHA-256 digests for staged scripts and imports.
//!
//! Digests are lowercase hexadecimal strings (64 characters).

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("digest mismatch for {path}: expected {expected}, got {actual}")]
  Mismatch {
    path: PathBuf,
    expected: String,
    actual: String,
  },
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<String, HashError> {
  let read_err = |source| HashError::Read {
    path: path.to_path_buf(),
    source,
  };
  let mut file = fs::File::open(path).map_err(read_err)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];
  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(hex::encode(hasher.finalize()))
}

pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}

/// Check that the file at `path` hashes to `expected` (case-insensitive).
pub fn verify_file(path: &Path, expected: &str) -> Result<(), HashError> {
  let actual = hash_file(path)?;
  if !actual.eq_ignore_ascii_case(expected) {
    return Err(HashError::Mismatch {
      path: path.to_path_buf(),
      expected: expected.to_string(),
      actual,
    });
  }
  Ok(())
}
