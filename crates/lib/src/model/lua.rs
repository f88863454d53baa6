//! Lua binding for `conduit.model(name, descriptor)`.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;

use super::registry::{BelongsTo, ModelDescriptor, ModelRegistry};
use crate::schema::builder::parse_delete_rule;
use crate::schema::column_from_lua;

/// Register `model` and `models` on the runtime table.
///
/// `conduit.model` never raises: malformed descriptors are recorded in the
/// registry and reported when the schema is built.
pub fn register_model_api(lua: &Lua, conduit: &LuaTable, registry: Rc<RefCell<ModelRegistry>>) -> LuaResult<()> {
  let models = registry.clone();
  let model_fn = lua.create_function(move |_, (name, descriptor): (LuaValue, LuaValue)| {
    let name = match name {
      LuaValue::String(s) => s.to_str()?.to_string(),
      other => {
        models
          .borrow_mut()
          .reject("<unnamed>", format!("model name must be a string, got {}", other.type_name()));
        return Ok(());
      }
    };

    let parsed = match descriptor {
      LuaValue::Table(t) => descriptor_from_lua(&name, &t),
      LuaValue::Nil => Ok(ModelDescriptor::new(name.clone(), Vec::new())),
      other => Err(LuaError::external(format!(
        "descriptor must be a table, got {}",
        other.type_name()
      ))),
    };

    match parsed {
      Ok(descriptor) => models.borrow_mut().register(descriptor),
      Err(err) => models.borrow_mut().reject(name, error_message(&err)),
    }
    Ok(())
  })?;
  conduit.set("model", model_fn)?;

  let models_fn = lua.create_function(move |lua, ()| {
    let names: Vec<String> = registry.borrow().models().iter().map(|m| m.name.clone()).collect();
    lua.create_sequence_from(names)
  })?;
  conduit.set("models", models_fn)?;

  Ok(())
}

fn descriptor_from_lua(name: &str, t: &LuaTable) -> LuaResult<ModelDescriptor> {
  let mut descriptor = ModelDescriptor::new(name, Vec::new());
  if let Some(table) = t.get::<Option<String>>("table")? {
    descriptor.table = table;
  }

  if let Some(columns) = t.get::<Option<LuaTable>>("columns")? {
    for column in columns.sequence_values::<LuaTable>() {
      descriptor.columns.push(column_from_lua(&column?)?);
    }
  }

  if let Some(relations) = t.get::<Option<LuaTable>>("belongs_to")? {
    for relation in relations.sequence_values::<LuaTable>() {
      let relation = relation?;
      let rel_name: String = relation
        .get::<Option<String>>("name")?
        .ok_or_else(|| LuaError::external("belongs_to entry requires a 'name' field"))?;
      let model: String = relation
        .get::<Option<String>>("model")?
        .ok_or_else(|| LuaError::external(format!("belongs_to '{}' requires a 'model' field", rel_name)))?;
      descriptor.belongs_to.push(BelongsTo {
        nullable: relation.get::<Option<bool>>("nullable")?.unwrap_or(false),
        on_delete: parse_delete_rule(relation.get::<Option<String>>("on_delete")?.as_deref())?,
        name: rel_name,
        model,
      });
    }
  }

  Ok(descriptor)
}

/// The message of an error without mlua's wrapping.
fn error_message(err: &LuaError) -> String {
  match err {
    LuaError::ExternalError(inner) => inner.to_string(),
    LuaError::CallbackError { cause, .. } => error_message(cause),
    LuaError::FromLuaConversionError { from, to, .. } => format!("expected {} but found {}", to, from),
    other => other.to_string(),
  }
}
