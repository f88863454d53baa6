//! Range excision and staging of rewritten sources.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::types::{ByteRange, TransformError};

/// Return `source` with every range in `ranges` removed.
///
/// All ranges are validated before anything is mutated. Removal then runs from
/// the highest start offset down so an earlier removal never shifts the
/// offsets of a range still waiting to be removed.
pub fn remove_ranges(source: &str, ranges: &[ByteRange]) -> Result<String, TransformError> {
  let mut ordered = ranges.to_vec();
  ordered.sort();
  validate(source, &ordered)?;

  let mut out = source.to_string();
  for range in ordered.iter().rev() {
    out.replace_range(range.as_range(), "");
  }
  Ok(out)
}

/// Remove `ranges` from `source` and write the result to `dest`.
///
/// Parent directories are created as needed and any previous content at
/// `dest` is replaced.
pub fn stage(source: &str, ranges: &[ByteRange], dest: &Path) -> Result<String, TransformError> {
  let transformed = remove_ranges(source, ranges)?;

  let write_err = |source| TransformError::Write {
    path: dest.to_path_buf(),
    source,
  };
  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent).map_err(write_err)?;
  }
  fs::write(dest, &transformed).map_err(write_err)?;

  debug!(
    dest = %dest.display(),
    removed = ranges.len(),
    bytes = transformed.len(),
    "staged transformed source"
  );
  Ok(transformed)
}

/// `ranges` must already be sorted.
fn validate(source: &str, ranges: &[ByteRange]) -> Result<(), TransformError> {
  for range in ranges {
    if range.start > range.end || range.end > source.len() {
      return Err(TransformError::OutOfBounds {
        range: *range,
        len: source.len(),
      });
    }
    if !source.is_char_boundary(range.start) || !source.is_char_boundary(range.end) {
      return Err(TransformError::NotCharBoundary { range: *range });
    }
  }

  for pair in ranges.windows(2) {
    if pair[0].overlaps(&pair[1]) {
      return Err(TransformError::Overlapping {
        first: pair[0],
        second: pair[1],
      });
    }
  }
  Ok(())
}
