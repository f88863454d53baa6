//! Build and clean command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn build_stages_entry_and_writes_schema() {
  let env = TestEnv::from_fixture("app");

  env
    .run(&["build"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Build complete"))
    .stdout(predicate::str::contains("teams, users"))
    .stderr(predicate::str::contains("hook saw 2 models"));

  let staged = env.read_file("build/main.lua");
  assert!(!staged.contains("function main"));
  assert!(staged.contains("conduit.on_build"));
  assert!(env.build_dir().join("schema.json").exists());
}

#[test]
fn build_json_output_is_a_report() {
  let env = TestEnv::from_fixture("app");

  let output = env.run(&["build", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["hooks_run"], 1);
  assert_eq!(report["tables"], serde_json::json!(["teams", "users"]));
}

#[test]
fn clean_build_clean_leaves_no_build_directory() {
  let env = TestEnv::from_fixture("app");

  env.run(&["clean"]).assert().success().stdout(predicate::str::contains("Nothing to clean"));
  env.run(&["build"]).assert().success();
  assert!(env.build_dir().exists());

  env.run(&["clean"]).assert().success().stdout(predicate::str::contains("Removed"));
  assert!(!env.build_dir().exists());
}

#[test]
fn syntax_error_fails_before_staging() {
  let env = TestEnv::from_fixture("app");
  env.write_file("bin/main.lua", "function main(\n");

  env
    .run(&["build"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Build failed"));
  assert!(!env.build_dir().join("main.lua").exists());
}

#[test]
fn runaway_hook_times_out() {
  let env = TestEnv::from_fixture("app");
  env.write_file(
    "bin/main.lua",
    "require('conduit').on_build(function() while true do end end)\n",
  );

  env
    .run(&["build", "--timeout", "500ms"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("timed out"));
}

#[test]
fn broken_model_is_reported() {
  let env = TestEnv::from_fixture("app");
  env.write_file(
    "src/models.lua",
    r#"
    require("conduit").model("Post", {
      columns = { { name = "id", type = "integer", primary_key = true } },
      belongs_to = { { name = "author", model = "Author" } },
    })
    return { names = {} }
    "#,
  );

  env
    .run(&["build"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("belongs to unknown model 'Author'"));
}

#[test]
fn custom_entry_is_staged_under_its_own_name() {
  let env = TestEnv::from_fixture("app");
  env.write_file("scripts/serve.lua", "function main() end\nrequire('app.models')\n");

  env.run(&["build", "--entry", "scripts/serve.lua"]).assert().success();
  assert_eq!(env.read_file("build/serve.lua"), "\nrequire('app.models')\n");
}
