//! Executor behavior against shell stand-ins for the worker.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use conduit_lib::build::{BuildExecutable, BuildReport};
use conduit_lib::isolate::{IsolateError, IsolateExecutionError, IsolateRequest};

use super::common::{executor, respond, respond_with_version};

fn request(temp: &TempDir) -> IsolateRequest<BuildExecutable> {
  IsolateRequest::new(
    BuildExecutable {
      context: BTreeMap::new(),
    },
    temp.path().join("packages.json"),
    vec![],
  )
}

const REPORT: &str = r#"{"status":"success","payload":{"hooks_run":2,"tables":["users"],"schema_path":"/p/build/schema.json"}}"#;

#[tokio::test]
async fn success_payload_is_returned() {
  let temp = TempDir::new().unwrap();
  let report = executor(&respond(REPORT), Duration::from_secs(10))
    .run(request(&temp), None)
    .await
    .unwrap();

  assert_eq!(
    report,
    BuildReport {
      hooks_run: 2,
      tables: vec!["users".to_string()],
      schema_path: "/p/build/schema.json".into(),
    }
  );
}

#[tokio::test]
async fn slow_worker_times_out() {
  let temp = TempDir::new().unwrap();
  let start = Instant::now();
  let err = executor("sleep 5", Duration::from_millis(200))
    .run(request(&temp), None)
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    IsolateError::Execution(IsolateExecutionError::Timeout(bound)) if bound == Duration::from_millis(200)
  ));
  assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn exit_without_response_is_a_crash() {
  let temp = TempDir::new().unwrap();
  let err = executor("exit 3", Duration::from_secs(10))
    .run(request(&temp), None)
    .await
    .unwrap_err();

  match err {
    IsolateError::Execution(IsolateExecutionError::Crashed { status }) => assert_eq!(status.code(), Some(3)),
    other => panic!("expected a crash, got {other:?}"),
  }
}

#[tokio::test]
async fn garbage_response_is_malformed() {
  let temp = TempDir::new().unwrap();
  let err = executor("cat > /dev/null; echo '@@conduit-response {oops'", Duration::from_secs(10))
    .run(request(&temp), None)
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    IsolateError::Execution(IsolateExecutionError::MalformedResponse(_))
  ));
}

#[tokio::test]
async fn other_protocol_versions_are_rejected() {
  let temp = TempDir::new().unwrap();
  let err = executor(&respond_with_version(9, REPORT), Duration::from_secs(10))
    .run(request(&temp), None)
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    IsolateError::Execution(IsolateExecutionError::VersionMismatch { expected: 1, actual: 9 })
  ));
}

#[tokio::test]
async fn domain_failures_keep_their_class() {
  let temp = TempDir::new().unwrap();

  let schema = r#"{"status":"failure","class":"SchemaError","message":"duplicate table 'users'"}"#;
  let err = executor(&respond(schema), Duration::from_secs(10))
    .run(request(&temp), None)
    .await
    .unwrap_err();
  assert!(matches!(err, IsolateError::Schema(ref m) if m == "duplicate table 'users'"));

  let model = r#"{"status":"failure","class":"ModelError","message":"model 'User': no columns"}"#;
  let err = executor(&respond(model), Duration::from_secs(10))
    .run(request(&temp), None)
    .await
    .unwrap_err();
  assert!(matches!(err, IsolateError::Model(_)));

  let unknown = r#"{"status":"failure","class":"DiskFull","message":"no space"}"#;
  let err = executor(&respond(unknown), Duration::from_secs(10))
    .run(request(&temp), None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    IsolateError::Execution(IsolateExecutionError::Unhandled { ref class, .. }) if class == "DiskFull"
  ));
}

#[tokio::test]
async fn diagnostics_arrive_in_order() {
  let temp = TempDir::new().unwrap();
  let script = format!("echo first >&2; echo second >&2; echo noise; {}", respond(REPORT));
  let mut lines = Vec::new();
  let mut handler = |line: &str| lines.push(line.to_string());

  executor(&script, Duration::from_secs(10))
    .run(request(&temp), Some(&mut handler))
    .await
    .unwrap();

  assert_eq!(lines, vec!["first", "second"]);
}

#[tokio::test]
async fn first_response_wins() {
  let temp = TempDir::new().unwrap();
  let second = r#"{"status":"failure","class":"SchemaError","message":"late"}"#;
  let script = format!("{}; {}", respond(REPORT), respond(second));

  let report = executor(&script, Duration::from_secs(10))
    .run(request(&temp), None)
    .await
    .unwrap();
  assert_eq!(report.hooks_run, 2);
}

#[tokio::test]
async fn missing_worker_program_fails_to_spawn() {
  use conduit_lib::config::{ExecutorConfig, WorkerCommand};
  use conduit_lib::isolate::IsolateExecutor;

  let temp = TempDir::new().unwrap();
  let config = ExecutorConfig::new(WorkerCommand::conduit(temp.path().join("no-such-worker")));
  let err = IsolateExecutor::new(config).run(request(&temp), None).await.unwrap_err();

  assert!(matches!(err, IsolateError::Execution(IsolateExecutionError::Spawn { .. })));
}
