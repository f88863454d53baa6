//! Migrate command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn first_generate_creates_every_table() {
  let env = TestEnv::from_fixture("app");

  env
    .run(&["migrate", "generate", "--name", "init"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Generated migration"))
    .stdout(predicate::str::contains("Adding table 'teams'"))
    .stdout(predicate::str::contains("Adding column 'team_id' to table 'users'"));

  assert_eq!(env.migrations(), vec!["00000001_init.migration.lua"]);
  let source = env.read_file("migrations/00000001_init.migration.lua");
  assert!(source.starts_with("local migration = { version = 1 }"));
  assert_eq!(source.matches("db:create_table").count(), 2);
}

#[test]
fn unchanged_models_generate_nothing() {
  let env = TestEnv::from_fixture("app");

  env.run(&["migrate", "generate", "--name", "init"]).assert().success();
  env
    .run(&["migrate", "generate", "--name", "again"])
    .assert()
    .success()
    .stdout(predicate::str::contains("up to date"));

  assert_eq!(env.migrations().len(), 1);
}

#[test]
fn model_changes_generate_the_next_version() {
  let env = TestEnv::from_fixture("app");
  env.run(&["migrate", "generate", "--name", "init"]).assert().success();

  let models = env.read_file("src/models.lua").replace(
    r#"{ name = "name", type = "string", unique = true },"#,
    r#"{ name = "name", type = "string", unique = true },
    { name = "motto", type = "string", nullable = true },"#,
  );
  env.write_file("src/models.lua", &models);

  let output = env
    .run(&["migrate", "generate", "--name", "add_motto", "-o", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());
  let generated: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(generated["version"], 2);
  assert_eq!(
    generated["changes"],
    serde_json::json!(["Adding column 'motto' to table 'teams'"])
  );

  let source = env.read_file("migrations/00000002_add_motto.migration.lua");
  assert_eq!(source.matches("db:").count(), 1);
  assert!(source.contains(r#"db:add_column("teams", { name = "motto", type = "string", nullable = true })"#));
}

#[test]
fn schema_prints_replayed_tables() {
  let env = TestEnv::from_fixture("app");
  env.run(&["migrate", "schema"]).assert().success().stdout(predicate::str::contains("No migrations"));

  env.run(&["migrate", "generate", "--name", "init"]).assert().success();

  let output = env.run(&["migrate", "schema", "-o", "json"]).output().unwrap();
  assert!(output.status.success());
  let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let tables: Vec<_> = schema["tables"]
    .as_array()
    .unwrap()
    .iter()
    .map(|t| t["name"].as_str().unwrap().to_string())
    .collect();
  assert_eq!(tables, vec!["teams", "users"]);
}

#[test]
fn invalid_name_is_rejected() {
  let env = TestEnv::from_fixture("app");

  env
    .run(&["migrate", "generate", "--name", "Add Users"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid migration name"));
  assert!(env.migrations().is_empty());
}
