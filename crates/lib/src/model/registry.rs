use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{DeleteRule, Schema, SchemaColumn, SchemaError, SchemaTable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
  #[error("model '{model}': {message}")]
  Descriptor { model: String, message: String },

  #[error("model '{0}' is registered more than once")]
  Duplicate(String),

  #[error("model '{model}' belongs to unknown model '{target}'")]
  UnknownTarget { model: String, target: String },

  #[error("model '{model}' belongs to '{target}', which has no primary key")]
  TargetWithoutKey { model: String, target: String },

  #[error(transparent)]
  Schema(#[from] SchemaError),
}

/// A `belongs_to` relation: the owning model gets a foreign key column
/// `<name>_<target primary key>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BelongsTo {
  pub name: String,
  pub model: String,
  pub nullable: bool,
  pub on_delete: DeleteRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
  pub name: String,
  pub table: String,
  pub columns: Vec<SchemaColumn>,
  pub belongs_to: Vec<BelongsTo>,
}

impl ModelDescriptor {
  /// A descriptor whose table is the lowercased model name.
  pub fn new(name: impl Into<String>, columns: Vec<SchemaColumn>) -> Self {
    let name = name.into();
    Self {
      table: name.to_lowercase(),
      name,
      columns,
      belongs_to: Vec::new(),
    }
  }

  fn primary_key(&self) -> Option<&SchemaColumn> {
    self.columns.iter().find(|c| c.primary_key)
  }
}

/// The project's domain types, in registration order.
///
/// Registration never fails. Problems are kept and reported when the schema
/// is requested, so a broken model surfaces as one domain error instead of
/// aborting project code halfway through loading.
#[derive(Debug, Default)]
pub struct ModelRegistry {
  models: Vec<ModelDescriptor>,
  problems: Vec<ModelError>,
}

impl ModelRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&mut self, descriptor: ModelDescriptor) {
    if self.models.iter().any(|m| m.name == descriptor.name) {
      self.problems.push(ModelError::Duplicate(descriptor.name));
      return;
    }
    self.models.push(descriptor);
  }

  /// Record a descriptor that could not be parsed.
  pub fn reject(&mut self, model: impl Into<String>, message: impl Into<String>) {
    self.problems.push(ModelError::Descriptor {
      model: model.into(),
      message: message.into(),
    });
  }

  pub fn models(&self) -> &[ModelDescriptor] {
    &self.models
  }

  pub fn model(&self, name: &str) -> Option<&ModelDescriptor> {
    self.models.iter().find(|m| m.name == name)
  }

  pub fn len(&self) -> usize {
    self.models.len()
  }

  pub fn is_empty(&self) -> bool {
    self.models.is_empty()
  }

  /// The live schema: one table per model, in registration order.
  pub fn schema(&self) -> Result<Schema, ModelError> {
    if let Some(problem) = self.problems.first() {
      return Err(problem.clone());
    }

    let mut tables = Vec::with_capacity(self.models.len());
    for model in &self.models {
      let mut columns = model.columns.clone();
      for relation in &model.belongs_to {
        columns.push(self.foreign_key(model, relation)?);
      }
      tables.push(SchemaTable::new(model.table.clone(), columns));
    }

    let schema = Schema::new(tables);
    schema.validate()?;
    Ok(schema)
  }

  fn foreign_key(&self, model: &ModelDescriptor, relation: &BelongsTo) -> Result<SchemaColumn, ModelError> {
    let target = self.model(&relation.model).ok_or_else(|| ModelError::UnknownTarget {
      model: model.name.clone(),
      target: relation.model.clone(),
    })?;
    let key = target.primary_key().ok_or_else(|| ModelError::TargetWithoutKey {
      model: model.name.clone(),
      target: target.name.clone(),
    })?;

    let mut column = SchemaColumn::new(format!("{}_{}", relation.name, key.name), key.column_type)
      .indexed()
      .references(target.table.clone(), key.name.clone(), relation.on_delete);
    column.nullable = relation.nullable;
    Ok(column)
  }
}
