//! Module loading for project code.
//!
//! `require` keeps its normal behavior (caching, `package.preload`, C
//! loaders); only `package.searchers[2]`, the Lua file searcher, is replaced
//! with one that resolves module names through the project's
//! [`PackageConfig`]. Every chunk is named after its canonical path so error
//! messages point at the real file.

use std::fs;
use std::path::Path;

use mlua::prelude::*;

use crate::package::PackageConfig;

/// Load and evaluate a Lua file.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<LuaValue> {
  load_file_as_function(lua, path)?.call(())
}

/// Load a Lua file as a function without executing it.
pub fn load_file_as_function(lua: &Lua, path: &Path) -> LuaResult<LuaFunction> {
  let canonical_path = dunce::canonicalize(path)
    .map_err(|e| LuaError::external(format!("cannot resolve '{}': {}", path.display(), e)))?;
  let content = fs::read_to_string(&canonical_path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", canonical_path.display(), e)))?;

  lua
    .load(&content)
    .set_name(format!("@{}", canonical_path.display()))
    .into_function()
}

/// Searcher resolving `require(name)` through `packages`.
///
/// Follows the searcher protocol: `(loader, path)` on success, or a string
/// listing the files that were tried.
fn create_package_searcher(lua: &Lua, packages: PackageConfig) -> LuaResult<LuaFunction> {
  lua.create_function(move |lua, modname: String| {
    match packages.resolve(&modname) {
      Some(path) => {
        let loader = load_file_as_function(lua, &path)?;
        (LuaValue::Function(loader), path.display().to_string()).into_lua_multi(lua)
      }
      None => {
        let tried: String = packages
          .candidates(&modname)
          .iter()
          .map(|p| format!("\n\tno file '{}'", p.display()))
          .collect();
        tried.into_lua_multi(lua)
      }
    }
  })
}

/// Install the package searcher into the Lua runtime.
pub fn install_loaders(lua: &Lua, packages: PackageConfig) -> LuaResult<()> {
  let package: LuaTable = lua.globals().get("package")?;
  let searchers: LuaTable = package.get("searchers")?;
  searchers.set(2, create_package_searcher(lua, packages)?)?;
  Ok(())
}
