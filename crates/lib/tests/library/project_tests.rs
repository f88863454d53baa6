//! Staging, cleaning and migration generation against project directories.

use std::fs;

use conduit_lib::build::{BuildError, BuildManager};
use conduit_lib::migration::{MigrationError, MigrationStore, generate_migration, replay};
use conduit_lib::source::ParseError;

use super::common::Project;

#[test]
fn prepare_removes_every_main_and_nothing_else() {
  let entry = "\
local conduit = require(\"conduit\")

function main(args)
  return 1
end

local helper = function() return 'main' end

local function main()
  print(\"second\")
end

-- function main() in a comment stays
function main(...) end
";
  let project = Project::with_entry(entry);
  let staged = project.manager().prepare().unwrap();

  assert_eq!(staged.removed, 3);
  let text = fs::read_to_string(&staged.path).unwrap();
  assert_eq!(
    text,
    "\
local conduit = require(\"conduit\")



local helper = function() return 'main' end



-- function main() in a comment stays

"
  );
}

#[test]
fn methods_named_main_are_kept() {
  let entry = "local App = {}\nfunction App.main() end\nfunction App:main() end\nreturn App\n";
  let project = Project::with_entry(entry);
  let staged = project.manager().prepare().unwrap();

  assert_eq!(staged.removed, 0);
  assert_eq!(fs::read_to_string(&staged.path).unwrap(), entry);
}

#[test]
fn syntax_errors_abort_staging() {
  let project = Project::with_entry("local ok = 1\nfunction main(\n");
  let manager = project.manager();
  let err = manager.prepare().unwrap_err();
  assert!(!manager.context().target_script_file.exists());

  match err {
    BuildError::Parse(ParseError::Syntax { .. }) => {}
    other => panic!("expected a syntax error, got {other:?}"),
  }
}

#[test]
fn missing_entry_is_a_read_error() {
  let project = Project::empty();
  project.write("packages.json", "{}");
  let err = project.manager().prepare().unwrap_err();
  assert!(matches!(err, BuildError::Parse(ParseError::Read { .. })));
}

#[test]
fn clean_build_clean_leaves_nothing() {
  let project = Project::with_entry("function main() end\n");
  let manager: BuildManager = project.manager();
  let build_dir = manager.context().build_directory.clone();

  manager.clean().unwrap();
  assert!(!build_dir.exists());
  manager.prepare().unwrap();
  assert!(build_dir.join("main.lua").exists());
  manager.clean().unwrap();
  assert!(!build_dir.exists());
}

#[cfg(unix)]
mod generate {
  use std::time::Duration;

  use super::*;
  use crate::common::{executor, respond};

  const CREATE_NOTES: &str = r#"{"status":"success","payload":{"source":"local migration = { version = 1 }\n\nfunction migration.upgrade(db)\n  db:create_table(\"notes\", {\n    { name = \"id\", type = \"integer\", primary_key = true },\n  })\nend\n\nreturn migration\n","changes":["Adding table 'notes'"],"tables":["notes"]}}"#;
  const NO_CHANGES: &str =
    r#"{"status":"success","payload":{"source":"local migration = {}\n","changes":[],"tables":["notes"]}}"#;

  fn manager(project: &Project, outcome: &str) -> BuildManager {
    BuildManager::new(project.context(), executor(&respond(outcome), Duration::from_secs(10)))
  }

  #[tokio::test]
  async fn writes_the_next_migration() {
    let project = Project::with_entry("function main() end\n");
    let store = MigrationStore::for_project(project.path());

    let generated = generate_migration(&manager(&project, CREATE_NOTES), &store, "create_notes", None)
      .await
      .unwrap();

    assert_eq!(generated.version, 1);
    assert_eq!(generated.changes, vec!["Adding table 'notes'"]);
    let path = generated.path.unwrap();
    assert!(path.ends_with("migrations/00000001_create_notes.migration.lua"));

    let schema = replay(&store.list().unwrap()).unwrap();
    assert_eq!(schema.table_names(), vec!["notes"]);
  }

  #[tokio::test]
  async fn nothing_is_written_without_changes() {
    let project = Project::with_entry("function main() end\n");
    let store = MigrationStore::for_project(project.path());

    let generated = generate_migration(&manager(&project, NO_CHANGES), &store, "noop", None)
      .await
      .unwrap();

    assert_eq!(generated.path, None);
    assert!(store.list().unwrap().is_empty());
  }

  #[tokio::test]
  async fn versions_follow_existing_history() {
    let project = Project::with_entry("function main() end\n");
    let store = MigrationStore::for_project(project.path());
    store
      .write(4, "older", "return { upgrade = function(db) end }")
      .unwrap();

    let generated = generate_migration(&manager(&project, CREATE_NOTES), &store, "create_notes", None)
      .await
      .unwrap();
    assert_eq!(generated.version, 5);
  }

  #[tokio::test]
  async fn bad_names_are_rejected_before_any_work() {
    let project = Project::with_entry("function main(\n");
    let store = MigrationStore::for_project(project.path());

    let err = generate_migration(&manager(&project, CREATE_NOTES), &store, "Add Notes", None)
      .await
      .unwrap_err();
    assert!(matches!(err, MigrationError::InvalidName(_)));
    assert!(!project.context().build_directory.exists());
  }

  #[tokio::test]
  async fn worker_schema_errors_surface() {
    let project = Project::with_entry("function main() end\n");
    let store = MigrationStore::for_project(project.path());
    let outcome = r#"{"status":"failure","class":"SchemaError","message":"cannot change primary_key of column 'id' in table 'notes'"}"#;

    let err = generate_migration(&manager(&project, outcome), &store, "broken", None)
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      MigrationError::Isolate(conduit_lib::isolate::IsolateError::Schema(_))
    ));
  }
}
