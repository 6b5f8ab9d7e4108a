//! Batch Integration Tests
//!
//! Loading batch files from disk and running the lowered tasks end to
//! end (timer lookups only; resource tasks are exercised against canned
//! transports in the classify tests).

use std::io::Write;
use std::sync::Arc;

use fanout::{
    Batch, ErrorKind, HttpTransport, Orchestrator, Outcome, PartialFailureMode, Policy, Settled,
    Transport,
};

/// Transport for batches that contain no resource tasks
fn unused_transport() -> Arc<dyn Transport> {
    Arc::new(HttpTransport::new("http://localhost:1"))
}

#[test]
fn test_batch_loads_from_file() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("batch.yaml");

    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
name: from_file
description: Loaded from disk
policy: concurrent
tasks:
  - name: fetch-user
    resource: users/1
    required_fields:
      - name
"#
    )
    .unwrap();

    let batch = Batch::from_file(&path).unwrap();
    batch.validate().unwrap();

    assert_eq!(batch.name, "from_file");
    assert_eq!(batch.policy, Policy::Concurrent);
    assert_eq!(batch.tasks.len(), 1);
}

#[test]
fn test_missing_batch_file_is_an_error() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("does-not-exist.yaml");

    let err = Batch::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to read batch file"));
}

#[tokio::test]
async fn test_lookup_batch_runs_sequentially() {
    let yaml = r#"
name: lookups
description: Two quick lookups
tasks:
  - name: first
    user_id: 1
    delay_ms: 10
  - name: second
    user_id: 2
    delay_ms: 10
"#;
    let batch = Batch::from_yaml(yaml).unwrap();
    batch.validate().unwrap();

    let tasks = batch.build_tasks(unused_transport());
    let outcome = Orchestrator::new()
        .execute(tasks, batch.policy, batch.options())
        .await;

    match outcome {
        Outcome::Success { values } => {
            assert_eq!(values.len(), 2);
            assert_eq!(values[0]["id"], 1);
            assert_eq!(values[1]["id"], 2);
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_batch_collects_classified_failures() {
    let yaml = r#"
name: mixed
description: One bad id among good ones
policy: concurrent
on_partial_failure: collect_all
tasks:
  - name: good
    user_id: 5
    delay_ms: 10
  - name: bad
    user_id: -5
    delay_ms: 10
  - name: also-good
    user_id: 6
    delay_ms: 10
"#;
    let batch = Batch::from_yaml(yaml).unwrap();
    batch.validate().unwrap();
    assert_eq!(batch.on_partial_failure, PartialFailureMode::CollectAll);

    let tasks = batch.build_tasks(unused_transport());
    let outcome = Orchestrator::new()
        .execute(tasks, batch.policy, batch.options())
        .await;

    match outcome {
        Outcome::PartialFailure {
            results,
            first_error,
        } => {
            assert_eq!(results.len(), 3);
            assert_eq!(results[0].value().unwrap()["id"], 5);
            assert_eq!(results[2].value().unwrap()["id"], 6);

            match &results[1] {
                Settled::Failed(detail) => {
                    assert_eq!(detail.kind, ErrorKind::InvalidInput);
                    assert_eq!(detail.task_name, "bad");
                }
                other => panic!("expected failed entry, got {:?}", other),
            }

            assert_eq!(first_error.task_index, 1);
        }
        other => panic!("expected partial failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_batch_fails_fast_by_default() {
    let yaml = r#"
name: fail_fast
description: Default failure handling halts the report
policy: concurrent
tasks:
  - name: slow-good
    user_id: 9
    delay_ms: 200
  - name: quick-bad
    user_id: 0
    delay_ms: 10
"#;
    let batch = Batch::from_yaml(yaml).unwrap();

    let tasks = batch.build_tasks(unused_transport());
    let outcome = Orchestrator::new()
        .execute(tasks, batch.policy, batch.options())
        .await;

    match outcome {
        Outcome::Failure { error } => {
            assert_eq!(error.kind, ErrorKind::InvalidInput);
            assert_eq!(error.task_name, "quick-bad");
            assert_eq!(error.task_index, 1);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_batch_runs_to_empty_success() {
    let yaml = r#"
name: empty
description: Identity case
tasks: []
"#;
    let batch = Batch::from_yaml(yaml).unwrap();
    batch.validate().unwrap();

    let tasks = batch.build_tasks(unused_transport());
    let outcome = Orchestrator::new()
        .execute(tasks, batch.policy, batch.options())
        .await;

    assert_eq!(outcome, Outcome::Success { values: vec![] });
}
