//! Implementation of the `conduit migrate` commands.

use std::path::Path;

use anyhow::{Context, Result};

use conduit_lib::migration::{MigrationStore, generate_migration, replay};

use crate::ProjectArgs;
use crate::output::{OutputFormat, print_change, print_diagnostic, print_info, print_json, print_stat, print_success};

/// Generate the next migration.
///
/// Replays `migrations/`, diffs the result against the live models in a
/// worker and writes a new migration file when anything changed.
pub fn cmd_migrate_generate(args: &ProjectArgs, name: &str, output: OutputFormat) -> Result<()> {
  let manager = super::build_manager(args)?;
  let store = MigrationStore::for_project(&manager.context().source_application_directory);

  let mut forward = |line: &str| print_diagnostic(line);
  let generated = super::runtime()?
    .block_on(generate_migration(&manager, &store, name, Some(&mut forward)))
    .context("Migration generation failed")?;

  if output.is_json() {
    return print_json(&generated);
  }

  match &generated.path {
    None => print_info("Schema is up to date, no migration generated."),
    Some(path) => {
      print_success(&format!("Generated migration {}", path.display()));
      for change in &generated.changes {
        print_change(change);
      }
    }
  }
  print_stat("Tables", &generated.tables.join(", "));
  Ok(())
}

/// Print the schema the project's migrations replay to.
pub fn cmd_migrate_schema(project: &Path, output: OutputFormat) -> Result<()> {
  let project = dunce::canonicalize(project).with_context(|| format!("Cannot use project {}", project.display()))?;
  let store = MigrationStore::for_project(&project);
  let files = store.list().context("Failed to list migrations")?;
  let schema = replay(&files).context("Failed to replay migrations")?;

  if output.is_json() {
    return print_json(&schema);
  }

  if files.is_empty() {
    print_info("No migrations found.");
    return Ok(());
  }

  print_success(&format!("{} migration(s), {} table(s)", files.len(), schema.tables.len()));
  for table in &schema.tables {
    println!();
    println!("{}", table.name);
    for column in &table.columns {
      let mut flags = Vec::new();
      if column.primary_key {
        flags.push("primary key".to_string());
      }
      if column.nullable {
        flags.push("nullable".to_string());
      }
      if column.unique {
        flags.push("unique".to_string());
      }
      if let Some(r) = &column.references {
        flags.push(format!("-> {}.{} ({})", r.table, r.column, r.on_delete));
      }
      let detail = if flags.is_empty() {
        column.column_type.to_string()
      } else {
        format!("{} [{}]", column.column_type, flags.join(", "))
      };
      print_stat(&column.name, &detail);
    }
  }
  Ok(())
}
