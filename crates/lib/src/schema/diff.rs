//! Structural comparison of two schemas.
//!
//! [`SchemaDiff::between`] produces an ordered list of [`SchemaChange`]s that,
//! applied to the `from` schema in order, yields the `to` schema. The ordering
//! keeps every intermediate state valid: foreign keys disappear before the
//! tables and columns they point at, deletions run before anything is added,
//! and referenced tables exist before a foreign key points at them.

use std::collections::{BTreeSet, HashSet};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use super::types::{Schema, SchemaColumn, SchemaError, SchemaTable};

/// A column property whose change is expressed as an alteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnProperty {
  Type,
  Nullable,
  Unique,
  Indexed,
  Default,
  OnDelete,
}

impl ColumnProperty {
  pub fn as_str(&self) -> &'static str {
    match self {
      ColumnProperty::Type => "type",
      ColumnProperty::Nullable => "nullable",
      ColumnProperty::Unique => "unique",
      ColumnProperty::Indexed => "indexed",
      ColumnProperty::Default => "default",
      ColumnProperty::OnDelete => "on_delete",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SchemaChange {
  CreateTable {
    table: SchemaTable,
  },
  DeleteTable {
    table: String,
  },
  AddColumn {
    table: String,
    column: SchemaColumn,
  },
  DeleteColumn {
    table: String,
    column: String,
  },
  /// `column` holds the column's complete new definition.
  AlterColumn {
    table: String,
    column: SchemaColumn,
    properties: Vec<ColumnProperty>,
  },
}

impl SchemaChange {
  pub fn description(&self) -> String {
    match self {
      SchemaChange::CreateTable { table } => format!("Adding table '{}'", table.name),
      SchemaChange::DeleteTable { table } => format!("Deleting table '{}'", table),
      SchemaChange::AddColumn { table, column } => {
        format!("Adding column '{}' to table '{}'", column.name, table)
      }
      SchemaChange::DeleteColumn { table, column } => {
        format!("Deleting column '{}' from table '{}'", column, table)
      }
      SchemaChange::AlterColumn {
        table,
        column,
        properties,
      } => {
        let props: Vec<_> = properties.iter().map(ColumnProperty::as_str).collect();
        format!(
          "Altering column '{}' in table '{}' ({})",
          column.name,
          table,
          props.join(", ")
        )
      }
    }
  }
}

/// An ordered set of changes taking one schema to another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
  pub changes: Vec<SchemaChange>,
}

impl SchemaDiff {
  /// Compute the changes that turn `from` into `to`.
  ///
  /// Both schemas are expected to be valid. Changing a column's primary key
  /// or autoincrement flag cannot be expressed and fails with
  /// [`SchemaError::UnsupportedAlteration`].
  pub fn between(from: &Schema, to: &Schema) -> Result<SchemaDiff, SchemaError> {
    let mut diff = Phases::default();

    let created: Vec<&SchemaTable> = to.tables.iter().filter(|t| from.table(&t.name).is_none()).collect();
    for table in dependency_order(&created).tables {
      let plain = table.columns.iter().filter(|c| !c.is_relationship()).cloned().collect();
      diff.create_tables.push(SchemaChange::CreateTable {
        table: SchemaTable::new(table.name.clone(), plain),
      });
      for column in table.columns.iter().filter(|c| c.is_relationship()) {
        diff.add_relationships.push(SchemaChange::AddColumn {
          table: table.name.clone(),
          column: column.clone(),
        });
      }
    }

    for table in &to.tables {
      if let Some(previous) = from.table(&table.name) {
        diff_table(previous, table, &mut diff)?;
      }
    }

    let deleted: Vec<&SchemaTable> = from.tables.iter().filter(|t| to.table(&t.name).is_none()).collect();
    let order = dependency_order(&deleted);
    for (table, column) in order.cyclic_relationships {
      diff.delete_tables.push(SchemaChange::DeleteColumn {
        table: table.name.clone(),
        column: column.name.clone(),
      });
    }
    for table in order.tables.into_iter().rev() {
      diff.delete_tables.push(SchemaChange::DeleteTable {
        table: table.name.clone(),
      });
    }

    Ok(diff.finish())
  }

  pub fn is_empty(&self) -> bool {
    self.changes.is_empty()
  }

  pub fn len(&self) -> usize {
    self.changes.len()
  }

  pub fn descriptions(&self) -> Vec<String> {
    self.changes.iter().map(SchemaChange::description).collect()
  }
}

/// Changes bucketed by emission phase.
#[derive(Default)]
struct Phases {
  create_tables: Vec<SchemaChange>,
  drop_retargeted: Vec<SchemaChange>,
  add_columns: Vec<SchemaChange>,
  add_relationships: Vec<SchemaChange>,
  alter_columns: Vec<SchemaChange>,
  delete_relationships: Vec<SchemaChange>,
  delete_columns: Vec<SchemaChange>,
  delete_tables: Vec<SchemaChange>,
}

impl Phases {
  fn finish(self) -> SchemaDiff {
    let changes = [
      self.drop_retargeted,
      self.delete_relationships,
      self.delete_tables,
      self.delete_columns,
      self.create_tables,
      self.add_columns,
      self.add_relationships,
      self.alter_columns,
    ]
    .into_iter()
    .flatten()
    .collect();
    SchemaDiff { changes }
  }
}

fn diff_table(from: &SchemaTable, to: &SchemaTable, diff: &mut Phases) -> Result<(), SchemaError> {
  let table = &to.name;

  for column in &to.columns {
    let Some(previous) = from.column(&column.name) else {
      let add = SchemaChange::AddColumn {
        table: table.clone(),
        column: column.clone(),
      };
      if column.is_relationship() {
        diff.add_relationships.push(add);
      } else {
        diff.add_columns.push(add);
      }
      continue;
    };

    if previous.primary_key != column.primary_key {
      return Err(unsupported(table, column, "primary key"));
    }
    if previous.autoincrement != column.autoincrement {
      return Err(unsupported(table, column, "autoincrement"));
    }

    let retargeted = match (&previous.references, &column.references) {
      (Some(old), Some(new)) => !old.same_target(new),
      (None, None) => false,
      _ => true,
    };
    if retargeted {
      diff.drop_retargeted.push(SchemaChange::DeleteColumn {
        table: table.clone(),
        column: column.name.clone(),
      });
      let add = SchemaChange::AddColumn {
        table: table.clone(),
        column: column.clone(),
      };
      if column.is_relationship() {
        diff.add_relationships.push(add);
      } else {
        diff.add_columns.push(add);
      }
      continue;
    }

    let properties = changed_properties(previous, column);
    if !properties.is_empty() {
      diff.alter_columns.push(SchemaChange::AlterColumn {
        table: table.clone(),
        column: column.clone(),
        properties,
      });
    }
  }

  for column in &from.columns {
    if to.column(&column.name).is_some() {
      continue;
    }
    let delete = SchemaChange::DeleteColumn {
      table: table.clone(),
      column: column.name.clone(),
    };
    if column.is_relationship() {
      diff.delete_relationships.push(delete);
    } else {
      diff.delete_columns.push(delete);
    }
  }
  Ok(())
}

fn changed_properties(from: &SchemaColumn, to: &SchemaColumn) -> Vec<ColumnProperty> {
  let mut out = Vec::new();
  if from.column_type != to.column_type {
    out.push(ColumnProperty::Type);
  }
  if from.nullable != to.nullable {
    out.push(ColumnProperty::Nullable);
  }
  if from.unique != to.unique {
    out.push(ColumnProperty::Unique);
  }
  if from.indexed != to.indexed {
    out.push(ColumnProperty::Indexed);
  }
  if from.default_value != to.default_value {
    out.push(ColumnProperty::Default);
  }
  if let (Some(old), Some(new)) = (&from.references, &to.references)
    && old.on_delete != new.on_delete
  {
    out.push(ColumnProperty::OnDelete);
  }
  out
}

fn unsupported(table: &str, column: &SchemaColumn, property: &'static str) -> SchemaError {
  SchemaError::UnsupportedAlteration {
    table: table.to_string(),
    column: column.name.clone(),
    property,
  }
}

struct DependencyOrder<'a> {
  /// Referenced tables before the tables referencing them.
  tables: Vec<&'a SchemaTable>,
  /// Relationship columns that participate in a reference cycle.
  cyclic_relationships: Vec<(&'a SchemaTable, &'a SchemaColumn)>,
}

/// Order `tables` so that every table comes after the tables it references.
///
/// Only references between members of `tables` are considered. References
/// inside a cycle are set aside and reported; the remaining graph is acyclic
/// and independent tables keep their declaration order.
fn dependency_order<'a>(tables: &[&'a SchemaTable]) -> DependencyOrder<'a> {
  let mut graph: DiGraph<usize, ()> = DiGraph::new();
  let nodes: Vec<NodeIndex> = (0..tables.len()).map(|i| graph.add_node(i)).collect();
  let index_of = |name: &str| tables.iter().position(|t| t.name == name);

  let mut edges = Vec::new();
  for (i, table) in tables.iter().enumerate() {
    for referenced in table.referenced_tables() {
      if let Some(j) = index_of(referenced) {
        edges.push((j, i));
      }
    }
  }

  let mut component = vec![0; tables.len()];
  {
    let mut cyclic: DiGraph<usize, ()> = DiGraph::new();
    let cnodes: Vec<NodeIndex> = (0..tables.len()).map(|i| cyclic.add_node(i)).collect();
    for &(from, to) in &edges {
      cyclic.add_edge(cnodes[from], cnodes[to], ());
    }
    for (id, scc) in tarjan_scc(&cyclic).into_iter().enumerate() {
      for node in scc {
        component[cyclic[node]] = id;
      }
    }
  }

  let mut seen = HashSet::new();
  for &(from, to) in &edges {
    if component[from] != component[to] && seen.insert((from, to)) {
      graph.add_edge(nodes[from], nodes[to], ());
    }
  }

  let ordered = stable_toposort(&graph).into_iter().map(|i| tables[i]).collect();

  let mut cyclic_relationships = Vec::new();
  for (i, table) in tables.iter().enumerate() {
    for column in &table.columns {
      let Some(rel) = &column.references else {
        continue;
      };
      if rel.table == table.name {
        continue;
      }
      if let Some(j) = index_of(&rel.table)
        && component[i] == component[j]
      {
        cyclic_relationships.push((*table, column));
      }
    }
  }

  DependencyOrder {
    tables: ordered,
    cyclic_relationships,
  }
}

/// Kahn's algorithm, always taking the lowest ready node index next.
///
/// `graph` must be acyclic; node weights are positions in the caller's slice.
fn stable_toposort(graph: &DiGraph<usize, ()>) -> Vec<usize> {
  let mut in_degree: Vec<usize> = graph
    .node_indices()
    .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
    .collect();
  let mut ready: BTreeSet<usize> = graph
    .node_indices()
    .filter(|n| in_degree[n.index()] == 0)
    .map(NodeIndex::index)
    .collect();

  let mut order = Vec::with_capacity(in_degree.len());
  while let Some(next) = ready.pop_first() {
    let node = NodeIndex::new(next);
    order.push(graph[node]);
    for succ in graph.neighbors_directed(node, Direction::Outgoing) {
      in_degree[succ.index()] -= 1;
      if in_degree[succ.index()] == 0 {
        ready.insert(succ.index());
      }
    }
  }
  order
}
