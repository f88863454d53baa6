use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;

use crate::isolate::ExecutableRequest;
use crate::lua::{globals, loaders};
use crate::model::ModelRegistry;
use crate::package::PackageConfig;

/// Create the Lua runtime a worker executes project code in.
///
/// Installs the package searcher, the `conduit` runtime module, the
/// executable modules and a `print` that writes to stderr.
pub fn create_runtime(packages: PackageConfig, registry: Rc<RefCell<ModelRegistry>>) -> LuaResult<Lua> {
  let lua = Lua::new();

  globals::redirect_print(&lua)?;
  loaders::install_loaders(&lua, packages)?;
  globals::register_runtime_module(&lua, registry)?;
  globals::register_executable_modules(&lua, ExecutableRequest::KINDS)?;

  Ok(lua)
}

/// Create a restricted runtime for evaluating migration files.
///
/// Only the table, string, math and utf8 libraries are available: migrations
/// describe schema changes and have no business touching the filesystem or
/// loading other code.
pub fn create_sandbox() -> LuaResult<Lua> {
  Lua::new_with(
    LuaStdLib::TABLE | LuaStdLib::STRING | LuaStdLib::MATH | LuaStdLib::UTF8,
    LuaOptions::default(),
  )
}

/// The first line of an error's message, without mlua's wrapping.
///
/// Lua errors carry a stack traceback after the first line; only the first
/// line is shown to users.
pub fn error_summary(err: &LuaError) -> String {
  let full = match err {
    LuaError::RuntimeError(msg) => msg.clone(),
    LuaError::SyntaxError { message, .. } => message.clone(),
    LuaError::CallbackError { cause, .. } => return error_summary(cause),
    LuaError::WithContext { cause, .. } => return error_summary(cause),
    LuaError::ExternalError(inner) => inner.to_string(),
    other => other.to_string(),
  };
  full.lines().next().unwrap_or_default().trim().to_string()
}
