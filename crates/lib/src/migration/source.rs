//! Rendering of schema diffs as Lua migrations.
//!
//! A generated migration is a module returning a table with `upgrade(db)`,
//! `downgrade(db)` and `seed(db)`. Only `upgrade` is filled in; each change
//! becomes one call on the `db` object (see [`SchemaBuilder`]).
//!
//! [`SchemaBuilder`]: crate::schema::SchemaBuilder

use std::fmt::Write;

use crate::isolate::entry::lua_string;
use crate::schema::{SchemaChange, SchemaColumn, SchemaDiff};

const INDENT: &str = "  ";

/// Render `diff` as migration source.
pub fn render(diff: &SchemaDiff, version: Option<u32>) -> String {
  let mut out = String::new();
  match version {
    Some(v) => {
      let _ = writeln!(out, "local migration = {{ version = {} }}", v);
    }
    None => out.push_str("local migration = {}\n"),
  }
  out.push('\n');

  out.push_str("function migration.upgrade(db)\n");
  for change in &diff.changes {
    let _ = writeln!(out, "{}-- {}", INDENT, change.description());
    render_change(&mut out, change);
  }
  out.push_str("end\n\n");

  out.push_str("function migration.downgrade(db)\nend\n\n");
  out.push_str("function migration.seed(db)\nend\n\n");
  out.push_str("return migration\n");
  out
}

fn render_change(out: &mut String, change: &SchemaChange) {
  match change {
    SchemaChange::CreateTable { table } => {
      if table.columns.is_empty() {
        let _ = writeln!(out, "{}db:create_table({})", INDENT, lua_string(&table.name));
        return;
      }
      let _ = writeln!(out, "{}db:create_table({}, {{", INDENT, lua_string(&table.name));
      for column in &table.columns {
        let _ = writeln!(out, "{0}{0}{1},", INDENT, column_literal(column));
      }
      let _ = writeln!(out, "{}}})", INDENT);
    }
    SchemaChange::DeleteTable { table } => {
      let _ = writeln!(out, "{}db:delete_table({})", INDENT, lua_string(table));
    }
    SchemaChange::AddColumn { table, column } => {
      let _ = writeln!(
        out,
        "{}db:add_column({}, {})",
        INDENT,
        lua_string(table),
        column_literal(column)
      );
    }
    SchemaChange::DeleteColumn { table, column } => {
      let _ = writeln!(
        out,
        "{}db:delete_column({}, {})",
        INDENT,
        lua_string(table),
        lua_string(column)
      );
    }
    SchemaChange::AlterColumn { table, column, .. } => {
      let _ = writeln!(
        out,
        "{}db:alter_column({}, {})",
        INDENT,
        lua_string(table),
        column_literal(column)
      );
    }
  }
}

/// A column descriptor table. Flags are emitted only when set.
fn column_literal(column: &SchemaColumn) -> String {
  let mut fields = vec![
    format!("name = {}", lua_string(&column.name)),
    format!("type = {}", lua_string(column.column_type.as_str())),
  ];
  let flags = [
    ("primary_key", column.primary_key),
    ("autoincrement", column.autoincrement),
    ("nullable", column.nullable),
    ("unique", column.unique),
    ("indexed", column.indexed),
  ];
  for (flag, set) in flags {
    if set {
      fields.push(format!("{} = true", flag));
    }
  }
  if let Some(default) = &column.default_value {
    fields.push(format!("default = {}", lua_string(default)));
  }
  if let Some(r) = &column.references {
    fields.push(format!(
      "references = {{ table = {}, column = {}, on_delete = {} }}",
      lua_string(&r.table),
      lua_string(&r.column),
      lua_string(r.on_delete.as_str())
    ));
  }
  format!("{{ {} }}", fields.join(", "))
}
