//! Incremental schema construction.
//!
//! [`SchemaBuilder`] is the `db` object migrations receive in `upgrade(db)`.
//! Each mutation is checked against the current state so a migration that
//! deletes a missing table or adds a duplicate column fails at the offending
//! call.

use mlua::prelude::*;

use super::diff::SchemaChange;
use super::types::{ColumnType, DeleteRule, Relationship, Schema, SchemaColumn, SchemaError, SchemaTable};

#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
  schema: Schema,
}

impl SchemaBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_schema(schema: Schema) -> Self {
    Self { schema }
  }

  pub fn schema(&self) -> &Schema {
    &self.schema
  }

  pub fn into_schema(self) -> Schema {
    self.schema
  }

  pub fn create_table(&mut self, name: &str, columns: Vec<SchemaColumn>) -> Result<(), SchemaError> {
    if self.schema.table(name).is_some() {
      return Err(SchemaError::TableExists(name.to_string()));
    }
    let mut table = SchemaTable::new(name, Vec::with_capacity(columns.len()));
    for column in columns {
      if table.column(&column.name).is_some() {
        return Err(SchemaError::ColumnExists {
          table: name.to_string(),
          column: column.name,
        });
      }
      table.columns.push(column);
    }
    self.schema.tables.push(table);
    Ok(())
  }

  pub fn delete_table(&mut self, name: &str) -> Result<(), SchemaError> {
    let before = self.schema.tables.len();
    self.schema.tables.retain(|t| t.name != name);
    if self.schema.tables.len() == before {
      return Err(SchemaError::NoSuchTable(name.to_string()));
    }
    Ok(())
  }

  pub fn add_column(&mut self, table: &str, column: SchemaColumn) -> Result<(), SchemaError> {
    let target = self.table_mut(table)?;
    if target.column(&column.name).is_some() {
      return Err(SchemaError::ColumnExists {
        table: table.to_string(),
        column: column.name,
      });
    }
    target.columns.push(column);
    Ok(())
  }

  pub fn delete_column(&mut self, table: &str, column: &str) -> Result<(), SchemaError> {
    let target = self.table_mut(table)?;
    let before = target.columns.len();
    target.columns.retain(|c| c.name != column);
    if target.columns.len() == before {
      return Err(SchemaError::NoSuchColumn {
        table: table.to_string(),
        column: column.to_string(),
      });
    }
    Ok(())
  }

  /// Replace the definition of an existing column, keeping its position.
  pub fn alter_column(&mut self, table: &str, column: SchemaColumn) -> Result<(), SchemaError> {
    let target = self.table_mut(table)?;
    let existing = target.column_mut(&column.name).ok_or_else(|| SchemaError::NoSuchColumn {
      table: table.to_string(),
      column: column.name.clone(),
    })?;
    *existing = column;
    Ok(())
  }

  pub fn apply(&mut self, change: &SchemaChange) -> Result<(), SchemaError> {
    match change {
      SchemaChange::CreateTable { table } => self.create_table(&table.name, table.columns.clone()),
      SchemaChange::DeleteTable { table } => self.delete_table(table),
      SchemaChange::AddColumn { table, column } => self.add_column(table, column.clone()),
      SchemaChange::DeleteColumn { table, column } => self.delete_column(table, column),
      SchemaChange::AlterColumn { table, column, .. } => self.alter_column(table, column.clone()),
    }
  }

  fn table_mut(&mut self, name: &str) -> Result<&mut SchemaTable, SchemaError> {
    self
      .schema
      .table_mut(name)
      .ok_or_else(|| SchemaError::NoSuchTable(name.to_string()))
  }
}

impl LuaUserData for SchemaBuilder {
  fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
    methods.add_method_mut("create_table", |_, this, (name, columns): (String, Option<LuaTable>)| {
      let mut parsed = Vec::new();
      if let Some(columns) = columns {
        for column in columns.sequence_values::<LuaTable>() {
          parsed.push(column_from_lua(&column?)?);
        }
      }
      this.create_table(&name, parsed).map_err(LuaError::external)
    });

    methods.add_method_mut("delete_table", |_, this, name: String| {
      this.delete_table(&name).map_err(LuaError::external)
    });

    methods.add_method_mut("add_column", |_, this, (table, column): (String, LuaTable)| {
      let column = column_from_lua(&column)?;
      this.add_column(&table, column).map_err(LuaError::external)
    });

    methods.add_method_mut("delete_column", |_, this, (table, column): (String, String)| {
      this.delete_column(&table, &column).map_err(LuaError::external)
    });

    methods.add_method_mut("alter_column", |_, this, (table, column): (String, LuaTable)| {
      let column = column_from_lua(&column)?;
      this.alter_column(&table, column).map_err(LuaError::external)
    });

    methods.add_method("has_table", |_, this, name: String| Ok(this.schema.table(&name).is_some()));
  }
}

/// Parse a column descriptor table.
///
/// Recognized fields: `name`, `type`, `nullable`, `unique`, `indexed`,
/// `primary_key`, `autoincrement`, `default` and
/// `references = { table, column, on_delete }`.
pub fn column_from_lua(t: &LuaTable) -> LuaResult<SchemaColumn> {
  let name: String = t
    .get::<Option<String>>("name")?
    .ok_or_else(|| LuaError::external("column requires a 'name' field"))?;
  let type_name: String = t
    .get::<Option<String>>("type")?
    .ok_or_else(|| LuaError::external(format!("column '{}' requires a 'type' field", name)))?;
  let column_type = ColumnType::parse(&type_name)
    .ok_or_else(|| LuaError::external(format!("column '{}' has unknown type '{}'", name, type_name)))?;

  let default_value = match t.get::<LuaValue>("default")? {
    LuaValue::Nil => None,
    LuaValue::String(s) => Some(s.to_str()?.to_string()),
    LuaValue::Integer(i) => Some(i.to_string()),
    LuaValue::Number(n) => Some(n.to_string()),
    LuaValue::Boolean(b) => Some(b.to_string()),
    other => {
      return Err(LuaError::external(format!(
        "column '{}' has an unsupported default of type {}",
        name,
        other.type_name()
      )));
    }
  };

  let references = match t.get::<Option<LuaTable>>("references")? {
    Some(r) => Some(relationship_from_lua(&name, &r)?),
    None => None,
  };

  Ok(SchemaColumn {
    column_type,
    nullable: t.get::<Option<bool>>("nullable")?.unwrap_or(false),
    unique: t.get::<Option<bool>>("unique")?.unwrap_or(false),
    indexed: t.get::<Option<bool>>("indexed")?.unwrap_or(false),
    primary_key: t.get::<Option<bool>>("primary_key")?.unwrap_or(false),
    autoincrement: t.get::<Option<bool>>("autoincrement")?.unwrap_or(false),
    default_value,
    references,
    name,
  })
}

fn relationship_from_lua(column: &str, t: &LuaTable) -> LuaResult<Relationship> {
  let table: String = t
    .get::<Option<String>>("table")?
    .ok_or_else(|| LuaError::external(format!("references of column '{}' requires 'table'", column)))?;
  let target_column: String = t
    .get::<Option<String>>("column")?
    .ok_or_else(|| LuaError::external(format!("references of column '{}' requires 'column'", column)))?;
  let on_delete = parse_delete_rule(t.get::<Option<String>>("on_delete")?.as_deref())?;
  Ok(Relationship {
    table,
    column: target_column,
    on_delete,
  })
}

pub(crate) fn parse_delete_rule(rule: Option<&str>) -> LuaResult<DeleteRule> {
  match rule {
    None => Ok(DeleteRule::default()),
    Some(s) => DeleteRule::parse(s).ok_or_else(|| LuaError::external(format!("unknown delete rule '{}'", s))),
  }
}
