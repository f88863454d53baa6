use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
  Integer,
  BigInteger,
  Double,
  String,
  Datetime,
  Boolean,
  Document,
}

impl ColumnType {
  pub const ALL: [ColumnType; 7] = [
    ColumnType::Integer,
    ColumnType::BigInteger,
    ColumnType::Double,
    ColumnType::String,
    ColumnType::Datetime,
    ColumnType::Boolean,
    ColumnType::Document,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ColumnType::Integer => "integer",
      ColumnType::BigInteger => "big_integer",
      ColumnType::Double => "double",
      ColumnType::String => "string",
      ColumnType::Datetime => "datetime",
      ColumnType::Boolean => "boolean",
      ColumnType::Document => "document",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|t| t.as_str() == s)
  }

  pub fn supports_autoincrement(&self) -> bool {
    matches!(self, ColumnType::Integer | ColumnType::BigInteger)
  }
}

impl std::fmt::Display for ColumnType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What happens to referencing rows when the referenced row is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteRule {
  #[default]
  Nullify,
  Restrict,
  Cascade,
  Default,
}

impl DeleteRule {
  pub fn as_str(&self) -> &'static str {
    match self {
      DeleteRule::Nullify => "nullify",
      DeleteRule::Restrict => "restrict",
      DeleteRule::Cascade => "cascade",
      DeleteRule::Default => "default",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    [
      DeleteRule::Nullify,
      DeleteRule::Restrict,
      DeleteRule::Cascade,
      DeleteRule::Default,
    ]
    .into_iter()
    .find(|r| r.as_str() == s)
  }
}

impl std::fmt::Display for DeleteRule {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A foreign key from the owning column to `table.column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
  pub table: String,
  pub column: String,
  #[serde(default)]
  pub on_delete: DeleteRule,
}

impl Relationship {
  /// True when both relationships point at the same column.
  pub fn same_target(&self, other: &Relationship) -> bool {
    self.table == other.table && self.column == other.column
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
  pub name: String,
  #[serde(rename = "type")]
  pub column_type: ColumnType,
  #[serde(default)]
  pub nullable: bool,
  #[serde(default)]
  pub unique: bool,
  #[serde(default)]
  pub indexed: bool,
  #[serde(default)]
  pub primary_key: bool,
  #[serde(default)]
  pub autoincrement: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_value: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub references: Option<Relationship>,
}

impl SchemaColumn {
  pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
    Self {
      name: name.into(),
      column_type,
      nullable: false,
      unique: false,
      indexed: false,
      primary_key: false,
      autoincrement: false,
      default_value: None,
      references: None,
    }
  }

  pub fn primary_key(mut self) -> Self {
    self.primary_key = true;
    self
  }

  pub fn autoincrement(mut self) -> Self {
    self.autoincrement = true;
    self
  }

  pub fn nullable(mut self) -> Self {
    self.nullable = true;
    self
  }

  pub fn unique(mut self) -> Self {
    self.unique = true;
    self
  }

  pub fn indexed(mut self) -> Self {
    self.indexed = true;
    self
  }

  pub fn with_default(mut self, value: impl Into<String>) -> Self {
    self.default_value = Some(value.into());
    self
  }

  pub fn references(mut self, table: impl Into<String>, column: impl Into<String>, on_delete: DeleteRule) -> Self {
    self.references = Some(Relationship {
      table: table.into(),
      column: column.into(),
      on_delete,
    });
    self
  }

  pub fn is_relationship(&self) -> bool {
    self.references.is_some()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTable {
  pub name: String,
  #[serde(default)]
  pub columns: Vec<SchemaColumn>,
}

impl SchemaTable {
  pub fn new(name: impl Into<String>, columns: Vec<SchemaColumn>) -> Self {
    Self {
      name: name.into(),
      columns,
    }
  }

  pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
    self.columns.iter().find(|c| c.name == name)
  }

  pub fn column_mut(&mut self, name: &str) -> Option<&mut SchemaColumn> {
    self.columns.iter_mut().find(|c| c.name == name)
  }

  pub fn primary_key(&self) -> Option<&SchemaColumn> {
    self.columns.iter().find(|c| c.primary_key)
  }

  /// Names of the tables this table references, excluding itself.
  pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
    self
      .columns
      .iter()
      .filter_map(|c| c.references.as_ref())
      .map(|r| r.table.as_str())
      .filter(move |t| *t != self.name)
  }
}

/// An ordered description of a data model's tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
  #[serde(default)]
  pub tables: Vec<SchemaTable>,
}

impl Schema {
  pub fn new(tables: Vec<SchemaTable>) -> Self {
    Self { tables }
  }

  pub fn table(&self, name: &str) -> Option<&SchemaTable> {
    self.tables.iter().find(|t| t.name == name)
  }

  pub fn table_mut(&mut self, name: &str) -> Option<&mut SchemaTable> {
    self.tables.iter_mut().find(|t| t.name == name)
  }

  pub fn table_names(&self) -> Vec<String> {
    self.tables.iter().map(|t| t.name.clone()).collect()
  }

  pub fn is_empty(&self) -> bool {
    self.tables.is_empty()
  }
}

/// Errors raised while validating, diffing or mutating schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
  #[error("invalid schema: {0}")]
  Invalid(String),

  #[error("table '{0}' already exists")]
  TableExists(String),

  #[error("table '{0}' does not exist")]
  NoSuchTable(String),

  #[error("column '{column}' already exists in table '{table}'")]
  ColumnExists { table: String, column: String },

  #[error("column '{column}' does not exist in table '{table}'")]
  NoSuchColumn { table: String, column: String },

  #[error("cannot change {property} of column '{column}' in table '{table}'")]
  UnsupportedAlteration {
    table: String,
    column: String,
    property: &'static str,
  },
}
