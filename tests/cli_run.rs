// tests/cli_run.rs

mod common;
use crate::common::{init_tracing, write_config};

use std::path::Path;

use stepgraph::cli::CliArgs;
use stepgraph::run;
use stepgraph::store::{FileSnapshotStore, SnapshotStore, StoredInstance};
use stepgraph::types::StepState;

const CONFIG: &str = r#"
[graph]
name = "release"
snapshot_dir = "state"

[[step]]
name = "Build"

[[step]]
name = "Test"
after = ["Build"]

[[step]]
name = "Publish"
after = ["Test"]
"#;

fn args(config: &Path) -> CliArgs {
    CliArgs {
        config: config.display().to_string(),
        instance: None,
        complete: Vec::new(),
        reset: false,
        dry_run: false,
        json: false,
        log_level: None,
    }
}

fn stored(dir: &Path, instance: &str) -> StoredInstance {
    FileSnapshotStore::new(dir.join("state"))
        .load(instance)
        .unwrap()
        .expect("snapshot exists")
}

fn states(dir: &Path, instance: &str) -> Vec<StepState> {
    stored(dir, instance)
        .steps
        .into_iter()
        .map(|r| r.state)
        .collect()
}

#[tokio::test]
async fn progress_carries_over_between_runs() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    // First run creates the instance.
    run(args(&config)).await.unwrap();
    assert_eq!(
        states(dir.path(), "release"),
        vec![StepState::Ready, StepState::Blocked, StepState::Blocked]
    );
    let created = stored(dir.path(), "release").create_time;
    assert!(created.is_some());

    let mut second = args(&config);
    second.complete = vec!["Build".to_string()];
    run(second).await.unwrap();

    let mut third = args(&config);
    third.complete = vec!["Test".to_string()];
    third.json = true;
    run(third).await.unwrap();

    assert_eq!(
        states(dir.path(), "release"),
        vec![StepState::Done, StepState::Done, StepState::Ready]
    );
    // Every step has moved since creation; the instance still keeps its own stamp.
    assert_eq!(stored(dir.path(), "release").create_time, created);
}

#[tokio::test]
async fn first_rejected_completion_stops_the_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let mut bad = args(&config);
    bad.instance = Some("rc-1".to_string());
    bad.complete = vec!["Build".to_string(), "Publish".to_string(), "Test".to_string()];

    let err = run(bad).await.unwrap_err();
    assert!(format!("{err:#}").contains("Publish"));

    // Build went through; Test was never attempted.
    assert_eq!(
        states(dir.path(), "rc-1"),
        vec![StepState::Done, StepState::Ready, StepState::Blocked]
    );
}

#[tokio::test]
async fn reset_discards_progress_and_changed_definitions_are_refused() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let mut first = args(&config);
    first.complete = vec!["Build".to_string()];
    run(first).await.unwrap();

    // Drop the Publish step: the stored snapshot no longer fits.
    let trimmed = CONFIG.replace("\n[[step]]\nname = \"Publish\"\nafter = [\"Test\"]\n", "\n");
    let config = write_config(dir.path(), &trimmed);
    assert!(run(args(&config)).await.is_err());

    let mut reset = args(&config);
    reset.reset = true;
    run(reset).await.unwrap();
    assert_eq!(
        states(dir.path(), "release"),
        vec![StepState::Ready, StepState::Blocked]
    );
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let mut dry = args(&config);
    dry.dry_run = true;
    dry.complete = vec!["Build".to_string()];
    run(dry).await.unwrap();

    assert!(!dir.path().join("state").exists());
}
