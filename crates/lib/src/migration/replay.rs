use std::fs;

use mlua::prelude::*;
use tracing::{debug, warn};

use super::MigrationError;
use super::store::MigrationFile;
use crate::lua::{create_sandbox, error_summary};
use crate::schema::{Schema, SchemaBuilder};

/// Replay `files` in order and return the schema they describe.
///
/// Every migration's `upgrade(db)` runs in one sandboxed runtime against a
/// shared [`SchemaBuilder`]. The resulting schema must validate.
pub fn replay(files: &[MigrationFile]) -> Result<Schema, MigrationError> {
  let lua = create_sandbox().map_err(|e| MigrationError::Lua {
    path: None,
    message: error_summary(&e),
  })?;
  let db = lua
    .create_userdata(SchemaBuilder::new())
    .map_err(|e| MigrationError::Lua {
      path: None,
      message: error_summary(&e),
    })?;

  for file in files {
    let source = fs::read_to_string(&file.path).map_err(|source| MigrationError::Read {
      path: file.path.clone(),
      source,
    })?;
    run_upgrade(&lua, &db, file, &source).map_err(|e| MigrationError::Lua {
      path: Some(file.path.clone()),
      message: error_summary(&e),
    })?;
    debug!(version = file.version, name = %file.name, "replayed migration");
  }

  let schema = db
    .take::<SchemaBuilder>()
    .map_err(|e| MigrationError::Lua {
      path: None,
      message: error_summary(&e),
    })?
    .into_schema();
  schema.validate()?;
  Ok(schema)
}

fn run_upgrade(lua: &Lua, db: &LuaAnyUserData, file: &MigrationFile, source: &str) -> LuaResult<()> {
  let module: LuaTable = lua
    .load(source)
    .set_name(format!("@{}", file.path.display()))
    .eval()?;

  if let Some(version) = module.get::<Option<u32>>("version")?
    && version != file.version
  {
    warn!(
      path = %file.path.display(),
      declared = version,
      expected = file.version,
      "migration declares a different version than its file name"
    );
  }

  let upgrade = module
    .get::<Option<LuaFunction>>("upgrade")?
    .ok_or_else(|| LuaError::runtime("migration does not define upgrade(db)"))?;
  upgrade.call::<()>(db.clone())
}
