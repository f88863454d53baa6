use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;

use crate::lua::{create_runtime, globals};
use crate::model::{ModelError, ModelRegistry};
use crate::package::PackageConfig;
use crate::schema::Schema;

/// Everything an executable can see inside the worker: the Lua runtime with
/// the project's code loaded and the models it registered.
pub struct WorkerContext {
  lua: Lua,
  models: Rc<RefCell<ModelRegistry>>,
}

impl WorkerContext {
  pub fn new(package_config: PackageConfig) -> LuaResult<Self> {
    let models = Rc::new(RefCell::new(ModelRegistry::new()));
    let lua = create_runtime(package_config, models.clone())?;
    Ok(Self { lua, models })
  }

  pub fn lua(&self) -> &Lua {
    &self.lua
  }

  /// The schema described by the registered models.
  pub fn live_schema(&self) -> Result<Schema, ModelError> {
    self.models.borrow().schema()
  }

  pub fn build_hooks(&self) -> LuaResult<Vec<LuaFunction>> {
    globals::build_hooks(&self.lua)
  }

  /// Whether `module` has been loaded by `require`.
  pub fn is_loaded(&self, module: &str) -> LuaResult<bool> {
    let package: LuaTable = self.lua.globals().get("package")?;
    let loaded: LuaTable = package.get("loaded")?;
    Ok(!matches!(loaded.get::<LuaValue>(module)?, LuaValue::Nil | LuaValue::Boolean(false)))
  }
}
