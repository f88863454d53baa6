//! Structural validation of schemas.

use std::collections::HashSet;

use super::types::{Schema, SchemaError, SchemaTable};

impl Schema {
  /// Check the structural rules every schema must satisfy.
  ///
  /// Returns the first violation found, in table then column order.
  pub fn validate(&self) -> Result<(), SchemaError> {
    let mut table_names = HashSet::new();
    for table in &self.tables {
      if table.name.trim().is_empty() {
        return Err(SchemaError::Invalid("table with an empty name".into()));
      }
      if !table_names.insert(table.name.as_str()) {
        return Err(SchemaError::Invalid(format!("duplicate table '{}'", table.name)));
      }
      validate_columns(table)?;
    }

    for table in &self.tables {
      validate_references(self, table)?;
    }
    Ok(())
  }
}

fn validate_columns(table: &SchemaTable) -> Result<(), SchemaError> {
  let mut column_names = HashSet::new();
  let mut primary_keys = 0;

  for column in &table.columns {
    if column.name.trim().is_empty() {
      return Err(SchemaError::Invalid(format!(
        "table '{}' has a column with an empty name",
        table.name
      )));
    }
    if !column_names.insert(column.name.as_str()) {
      return Err(SchemaError::Invalid(format!(
        "duplicate column '{}' in table '{}'",
        column.name, table.name
      )));
    }
    if column.primary_key {
      primary_keys += 1;
      if column.nullable {
        return Err(SchemaError::Invalid(format!(
          "primary key '{}.{}' cannot be nullable",
          table.name, column.name
        )));
      }
    }
    if column.autoincrement && !column.column_type.supports_autoincrement() {
      return Err(SchemaError::Invalid(format!(
        "column '{}.{}' of type {} cannot autoincrement",
        table.name, column.name, column.column_type
      )));
    }
  }

  if primary_keys > 1 {
    return Err(SchemaError::Invalid(format!(
      "table '{}' declares {} primary keys",
      table.name, primary_keys
    )));
  }
  Ok(())
}

fn validate_references(schema: &Schema, table: &SchemaTable) -> Result<(), SchemaError> {
  for column in &table.columns {
    let Some(rel) = &column.references else {
      continue;
    };
    let target = schema.table(&rel.table).ok_or_else(|| {
      SchemaError::Invalid(format!(
        "column '{}.{}' references unknown table '{}'",
        table.name, column.name, rel.table
      ))
    })?;
    let target_column = target.column(&rel.column).ok_or_else(|| {
      SchemaError::Invalid(format!(
        "column '{}.{}' references unknown column '{}.{}'",
        table.name, column.name, rel.table, rel.column
      ))
    })?;
    if target_column.column_type != column.column_type {
      return Err(SchemaError::Invalid(format!(
        "column '{}.{}' is {} but references '{}.{}' of type {}",
        table.name, column.name, column.column_type, rel.table, rel.column, target_column.column_type
      )));
    }
  }
  Ok(())
}
