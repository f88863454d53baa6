//! The `conduit` runtime module and worker-side global overrides.
//!
//! `require("conduit")` yields a table with:
//! - `conduit.version` - Version of the host binary
//! - `conduit.model(name, descriptor)` - Register a domain type
//! - `conduit.models()` - Names of the registered models, in order
//! - `conduit.on_build(fn)` - Register a hook run by `conduit build`
//! - `conduit.log(...)` - Write a diagnostic line

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use mlua::prelude::*;

use crate::consts::RUNTIME_MODULE;
use crate::model::{ModelRegistry, register_model_api};

/// Registry key of the table holding `on_build` hooks in registration order.
pub const BUILD_HOOKS_KEY: &str = "__conduit_build_hooks";

/// Prefix of the modules that define each executable kind.
pub const EXECUTABLE_MODULE_PREFIX: &str = "conduit.executable.";

/// Build the `conduit` table and make it available to `require`.
pub fn register_runtime_module(lua: &Lua, registry: Rc<RefCell<ModelRegistry>>) -> LuaResult<LuaTable> {
  let conduit = lua.create_table()?;
  conduit.set("version", env!("CARGO_PKG_VERSION"))?;

  register_model_api(lua, &conduit, registry)?;

  lua.set_named_registry_value(BUILD_HOOKS_KEY, lua.create_table()?)?;
  let on_build = lua.create_function(|lua, hook: LuaFunction| {
    let hooks: LuaTable = lua.named_registry_value(BUILD_HOOKS_KEY)?;
    hooks.push(hook)?;
    Ok(())
  })?;
  conduit.set("on_build", on_build)?;

  conduit.set("log", lua.create_function(|_, args: LuaMultiValue| write_diagnostic(&args))?)?;

  preload(lua, RUNTIME_MODULE, LuaValue::Table(conduit.clone()))?;
  Ok(conduit)
}

/// Preload one `conduit.executable.<kind>` module per executable kind.
pub fn register_executable_modules(lua: &Lua, kinds: &[&str]) -> LuaResult<()> {
  for kind in kinds {
    let module = lua.create_table()?;
    module.set("kind", *kind)?;
    preload(lua, &format!("{}{}", EXECUTABLE_MODULE_PREFIX, kind), LuaValue::Table(module))?;
  }
  Ok(())
}

/// Hooks registered with `conduit.on_build`, in registration order.
pub fn build_hooks(lua: &Lua) -> LuaResult<Vec<LuaFunction>> {
  let hooks: Option<LuaTable> = lua.named_registry_value(BUILD_HOOKS_KEY)?;
  match hooks {
    Some(hooks) => hooks.sequence_values::<LuaFunction>().collect(),
    None => Ok(Vec::new()),
  }
}

/// Send `print` to stderr; stdout belongs to the response protocol.
pub fn redirect_print(lua: &Lua) -> LuaResult<()> {
  let print = lua.create_function(|_, args: LuaMultiValue| write_diagnostic(&args))?;
  lua.globals().set("print", print)
}

fn preload(lua: &Lua, name: &str, value: LuaValue) -> LuaResult<()> {
  let package: LuaTable = lua.globals().get("package")?;
  let preload: LuaTable = package.get("preload")?;
  let loader = lua.create_function(move |_, _: LuaMultiValue| Ok(value.clone()))?;
  preload.set(name, loader)
}

fn write_diagnostic(args: &LuaMultiValue) -> LuaResult<()> {
  let mut parts = Vec::with_capacity(args.len());
  for value in args.iter() {
    parts.push(value.to_string()?);
  }
  let mut stderr = std::io::stderr().lock();
  writeln!(stderr, "{}", parts.join("\t")).map_err(LuaError::external)
}
