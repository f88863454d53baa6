use std::io;
use std::ops::Range;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A half-open byte range `[start, end)` into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteRange {
  pub start: usize,
  pub end: usize,
}

impl ByteRange {
  pub fn new(start: usize, end: usize) -> Self {
    Self { start, end }
  }

  pub fn len(&self) -> usize {
    self.end.saturating_sub(self.start)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn overlaps(&self, other: &ByteRange) -> bool {
    self.start < other.end && other.start < self.end
  }

  pub fn as_range(&self) -> Range<usize> {
    self.start..self.end
  }
}

impl std::fmt::Display for ByteRange {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}..{}", self.start, self.end)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
  /// `function name() ... end`
  Function,
  /// `local function name() ... end`
  LocalFunction,
}

/// A top-level declaration located by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
  pub kind: DeclarationKind,
  pub name: String,
  pub range: ByteRange,
}

/// Errors produced while parsing a source file.
#[derive(Debug, Error)]
pub enum ParseError {
  #[error("failed to read '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to load the Lua grammar: {0}")]
  Language(#[from] tree_sitter::LanguageError),

  #[error("parser produced no syntax tree for '{0}'")]
  NoTree(PathBuf),

  #[error("{path}:{line}:{column}: syntax error near '{snippet}'")]
  Syntax {
    path: PathBuf,
    line: usize,
    column: usize,
    snippet: String,
  },
}

/// Errors produced when a set of ranges cannot be excised from a text.
///
/// These indicate a contract violation between analyzer and transformer
/// rather than bad user input.
#[derive(Debug, Error)]
pub enum TransformError {
  #[error("range {range} is out of bounds for source of length {len}")]
  OutOfBounds { range: ByteRange, len: usize },

  #[error("range {range} does not fall on a UTF-8 character boundary")]
  NotCharBoundary { range: ByteRange },

  #[error("ranges {first} and {second} overlap")]
  Overlapping { first: ByteRange, second: ByteRange },

  #[error("failed to write staged source '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}
