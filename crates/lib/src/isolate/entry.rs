//! Synthesis of the worker entry script.
//!
//! The entry realizes the request's import manifest: it loads the runtime
//! library, then every caller import in order, then the module defining the
//! executable. Nothing else is visible to the worker.

use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use super::types::Import;
use crate::consts::RUNTIME_MODULE;

pub const ENTRY_FILE_NAME: &str = "entry.lua";

/// Render the entry script for `imports` and the executable `module`.
pub fn synthesize(imports: &[Import], module: &str) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "require({})", lua_string(RUNTIME_MODULE));
  for import in imports {
    match import {
      Import::Module { name } => {
        let _ = writeln!(out, "require({})", lua_string(name));
      }
      Import::File { path, .. } => {
        let _ = writeln!(out, "dofile({})", lua_string(&path.to_string_lossy()));
      }
    }
  }
  let _ = writeln!(out, "require({})", lua_string(module));
  out
}

/// Write the entry script into `dir` and return its path.
pub fn write_entry(dir: &Path, imports: &[Import], module: &str) -> std::io::Result<PathBuf> {
  let path = dir.join(ENTRY_FILE_NAME);
  fs::write(&path, synthesize(imports, module))?;
  Ok(path)
}

/// A double-quoted Lua string literal.
///
/// Rust's debug escapes (`\"`, `\\`, `\n`, `\t`, `\u{..}`) are all valid Lua
/// 5.4 escapes.
pub fn lua_string(s: &str) -> String {
  format!("{:?}", s)
}
