//! Worker-side execution of real projects, in process.

use std::fs;

use tempfile::TempDir;

use conduit_lib::build::{BuildExecutable, BuildReport};
use conduit_lib::consts::PROTOCOL_VERSION;
use conduit_lib::isolate::{Executable, ExecutableRequest, Outcome, WorkerRequest, WorkerResponse, entry, worker};
use conduit_lib::migration::{MigrationDiffExecutable, MigrationDiffOutput, MigrationStore, replay};
use conduit_lib::schema::{Schema, SchemaTable};

use super::common::{Project, app_project};

/// Stage the project and hand `executable` to a worker in this process.
fn run_in_worker(project: &Project, executable: ExecutableRequest, entry_dir: &TempDir) -> WorkerResponse {
  let manager = project.manager();
  let staged = manager.prepare().unwrap();
  let imports = manager.imports(&staged);
  let entry = entry::write_entry(entry_dir.path(), &imports, &executable.module()).unwrap();

  worker::handle_request(WorkerRequest {
    version: PROTOCOL_VERSION,
    package_config: manager.context().package_config.clone(),
    entry,
    imports,
    executable,
  })
}

fn payload<T: serde::de::DeserializeOwned>(response: WorkerResponse) -> T {
  match response.outcome {
    Outcome::Success { payload } => serde_json::from_value(payload).unwrap(),
    Outcome::Failure { class, message } => panic!("worker failed with {class}: {message}"),
  }
}

fn failure(response: WorkerResponse) -> (String, String) {
  match response.outcome {
    Outcome::Failure { class, message } => (class, message),
    Outcome::Success { payload } => panic!("expected a failure, got {payload}"),
  }
}

fn sorted(mut schema: Schema) -> Schema {
  schema.tables.sort_by(|a, b| a.name.cmp(&b.name));
  for table in &mut schema.tables {
    table.columns.sort_by(|a, b| a.name.cmp(&b.name));
  }
  schema
}

#[test]
fn build_runs_hooks_and_writes_schema() {
  let project = app_project();
  let entry_dir = TempDir::new().unwrap();
  let context = project.context();
  let executable = BuildExecutable {
    context: context.to_map(),
  }
  .into_request();

  let report: BuildReport = payload(run_in_worker(&project, executable, &entry_dir));
  assert_eq!(report.hooks_run, 1);
  assert_eq!(report.tables, vec!["teams", "users"]);
  assert_eq!(report.schema_path, context.build_directory.join("schema.json"));

  let snapshot: Schema = serde_json::from_str(&fs::read_to_string(&report.schema_path).unwrap()).unwrap();
  let team_id = snapshot.table("users").unwrap().column("team_id").unwrap();
  assert!(team_id.nullable && team_id.indexed);
  assert_eq!(team_id.references.as_ref().unwrap().table, "teams");

  let staged = fs::read_to_string(&context.target_script_file).unwrap();
  assert!(!staged.contains("function main"));
}

#[test]
fn first_migration_creates_everything_and_replays() {
  let project = app_project();
  let entry_dir = TempDir::new().unwrap();
  let executable = MigrationDiffExecutable {
    input_schema: Schema::default(),
    version: Some(1),
  }
  .into_request();

  let output: MigrationDiffOutput = payload(run_in_worker(&project, executable, &entry_dir));
  assert_eq!(
    output.changes,
    vec![
      "Adding table 'teams'",
      "Adding table 'users'",
      "Adding column 'team_id' to table 'users'",
    ]
  );
  assert_eq!(output.source.matches("db:create_table").count(), 2);
  assert_eq!(output.source.matches("db:add_column").count(), 1);

  let store = MigrationStore::for_project(project.path());
  store.write(1, "init", &output.source).unwrap();
  let replayed = replay(&store.list().unwrap()).unwrap();

  let report: BuildReport = payload(run_in_worker(
    &project,
    BuildExecutable {
      context: project.context().to_map(),
    }
    .into_request(),
    &entry_dir,
  ));
  let live: Schema = serde_json::from_str(&fs::read_to_string(report.schema_path).unwrap()).unwrap();
  assert_eq!(sorted(replayed.clone()), sorted(live));

  let again = MigrationDiffExecutable {
    input_schema: replayed,
    version: Some(2),
  }
  .into_request();
  let output: MigrationDiffOutput = payload(run_in_worker(&project, again, &entry_dir));
  assert!(output.changes.is_empty());
  assert!(!output.source.contains("db:"));
  assert_eq!(output.tables, vec!["teams", "users"]);
}

#[test]
fn tampered_staged_script_is_refused() {
  let project = app_project();
  let entry_dir = TempDir::new().unwrap();
  let manager = project.manager();
  let staged = manager.prepare().unwrap();
  let imports = manager.imports(&staged);
  fs::write(&staged.path, "error('injected')").unwrap();

  let executable = BuildExecutable {
    context: project.context().to_map(),
  }
  .into_request();
  let entry = entry::write_entry(entry_dir.path(), &imports, &executable.module()).unwrap();
  let response = worker::handle_request(WorkerRequest {
    version: PROTOCOL_VERSION,
    package_config: manager.context().package_config.clone(),
    entry,
    imports,
    executable,
  });

  let (class, message) = failure(response);
  assert_eq!(class, "ImportError");
  assert!(message.contains("digest mismatch"), "{message}");
}

#[test]
fn unknown_model_target_is_a_model_error() {
  let project = Project::with_entry(
    r#"
    require("conduit").model("Post", {
      columns = { { name = "id", type = "integer", primary_key = true } },
      belongs_to = { { name = "author", model = "Author" } },
    })
    "#,
  );
  let entry_dir = TempDir::new().unwrap();
  let executable = MigrationDiffExecutable {
    input_schema: Schema::default(),
    version: None,
  }
  .into_request();

  let (class, message) = failure(run_in_worker(&project, executable, &entry_dir));
  assert_eq!(class, "ModelError");
  assert_eq!(message, "model 'Post' belongs to unknown model 'Author'");
}

#[test]
fn project_errors_are_reduced_to_one_line() {
  let project = Project::with_entry("local x = nil\nreturn x.field\n");
  let entry_dir = TempDir::new().unwrap();
  let executable = BuildExecutable {
    context: project.context().to_map(),
  }
  .into_request();

  let (class, message) = failure(run_in_worker(&project, executable, &entry_dir));
  assert_eq!(class, "RuntimeError");
  assert!(message.contains("attempt to index a nil value"), "{message}");
  assert!(!message.contains('\n'));
}

#[test]
fn invalid_input_schema_is_a_schema_error() {
  let project = app_project();
  let entry_dir = TempDir::new().unwrap();
  let mut input = Schema::default();
  input.tables.push(SchemaTable::new("users", vec![]));
  input.tables.push(SchemaTable::new("users", vec![]));

  let executable = MigrationDiffExecutable {
    input_schema: input,
    version: None,
  }
  .into_request();
  let (class, message) = failure(run_in_worker(&project, executable, &entry_dir));
  assert_eq!(class, "SchemaError");
  assert!(message.contains("duplicate table 'users'"), "{message}");
}
