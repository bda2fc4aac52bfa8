// tests/engine_runtime.rs

mod common;
use crate::common::builders::StepDefsBuilder;
use crate::common::fake_clock::SteppingClock;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;

use stepgraph::clock::Clock;
use stepgraph::dag::Graph;
use stepgraph::dag::templates::pizza_order;
use stepgraph::engine::{CoreRuntime, Runtime};
use stepgraph::errors::{MutationError, StepgraphError};
use stepgraph::store::{MemorySnapshotStore, SnapshotStore};
use stepgraph::types::{InstanceState, StepState};

type TestResult = Result<(), Box<dyn Error>>;

fn pizza_core(instance: &str) -> CoreRuntime {
    let clock: Arc<dyn Clock> = Arc::new(SteppingClock::per_second());
    let graph = Graph::new(pizza_order(), clock.as_ref()).unwrap();
    CoreRuntime::new(instance, graph, clock)
}

#[tokio::test]
async fn completes_order_through_handle_and_persists_each_step() -> TestResult {
    init_tracing();
    let store = MemorySnapshotStore::new();
    let (handle, join) = Runtime::spawn(pizza_core("order-1"), Some(Box::new(store.clone())));

    assert_eq!(handle.next_ready_step().await?.unwrap().id(), "Payment");

    let report = handle.complete("Payment").await?;
    assert_eq!(report.newly_ready, vec!["MakeDough".to_string()]);

    let saved = store.load("order-1")?.expect("snapshot saved after completion");
    assert_eq!(saved.create_time, Some(SteppingClock::per_second().reading_at(0)));
    assert_eq!(saved.steps[0].state, StepState::Done);
    assert_eq!(saved.steps[1].state, StepState::Ready);

    for id in ["MakeDough", "AddToppings", "BakePizza", "Deliver"] {
        handle.complete(id).await?;
    }

    with_timeout(handle.wait_until_done()).await?;
    assert!(handle.all_done().await?);

    let summary = handle.summary().await?;
    assert_eq!(summary.state, InstanceState::Completed);
    assert_eq!((summary.done, summary.total), (5, 5));
    assert_eq!(
        store.load("order-1")?.map(|stored| stored.steps),
        Some(summary.steps.clone())
    );
    assert_eq!(handle.snapshot().await?, summary.steps);

    drop(handle);
    let graph = join.await?;
    assert!(graph.all_done());
    Ok(())
}

#[tokio::test]
async fn restored_instance_keeps_creation_time_once_every_step_has_moved() -> TestResult {
    init_tracing();
    let store = MemorySnapshotStore::new();
    let (handle, join) = Runtime::spawn(pizza_core("order-4"), Some(Box::new(store.clone())));

    // After BakePizza no step is left at its construction stamp.
    for id in ["Payment", "MakeDough", "AddToppings", "BakePizza"] {
        handle.complete(id).await?;
    }
    let before = handle.summary().await?;
    drop(handle);
    join.await?;

    let created = Some(SteppingClock::per_second().reading_at(0));
    assert_eq!(before.create_time, created);

    let stored = store.load("order-4")?.expect("snapshot saved after completion");
    assert_eq!(stored.create_time, created);
    assert!(stored.steps.iter().all(|r| Some(r.update_time) != created));

    let clock: Arc<dyn Clock> = Arc::new(SteppingClock::per_second());
    let graph = Graph::restore(stored.steps)?;
    let core = CoreRuntime::restore("order-4", graph, clock, stored.create_time);
    let (handle, _join) = Runtime::spawn(core, Some(Box::new(store.clone())));

    assert_eq!(handle.summary().await?, before);
    handle.complete("Deliver").await?;
    let after = handle.summary().await?;
    assert_eq!(after.state, InstanceState::Completed);
    assert_eq!(after.create_time, created);
    assert_eq!(store.load("order-4")?.and_then(|s| s.create_time), created);
    Ok(())
}

#[tokio::test]
async fn rejected_completion_is_returned_and_not_persisted() -> TestResult {
    init_tracing();
    let store = MemorySnapshotStore::new();
    let (handle, _join) = Runtime::spawn(pizza_core("order-2"), Some(Box::new(store.clone())));

    let err = handle.complete("Deliver").await.unwrap_err();
    assert!(matches!(
        err,
        StepgraphError::Mutation(MutationError::InvalidTransition {
            state: StepState::Blocked,
            ..
        })
    ));
    assert!(store.load("order-2")?.is_none());

    let step = handle.get_step("Deliver").await?;
    assert_eq!(step.state(), StepState::Blocked);
    assert!(matches!(
        handle.get_step("Tip").await,
        Err(StepgraphError::Query(_))
    ));
    Ok(())
}

#[tokio::test]
async fn concurrent_callers_are_serialised() -> TestResult {
    init_tracing();
    // Ten independent roots, one gate that waits for all of them.
    let roots: Vec<String> = (0..10).map(|i| format!("part-{i}")).collect();
    let root_refs: Vec<&str> = roots.iter().map(String::as_str).collect();
    let mut builder = StepDefsBuilder::new();
    for root in &root_refs {
        builder = builder.root(root);
    }
    let defs = builder.step("Assemble", &root_refs).build();

    let clock: Arc<dyn Clock> = Arc::new(SteppingClock::per_second());
    let graph = Graph::new(defs, clock.as_ref())?;
    let (handle, join) = Runtime::spawn(CoreRuntime::new("assembly", graph, clock), None);

    let waiter = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.wait_until_done().await })
    };

    let mut tasks = Vec::new();
    for root in roots.clone() {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move { handle.complete(&root).await }));
    }

    // Exactly one caller observes the gate opening.
    let mut promoted = Vec::new();
    for task in tasks {
        promoted.extend(task.await??.newly_ready);
    }
    assert_eq!(promoted, vec!["Assemble".to_string()]);

    assert!(!handle.all_done().await?);
    handle.complete("Assemble").await?;
    with_timeout(waiter).await??;

    drop(handle);
    let graph = join.await?;
    assert_eq!(graph.progress(), (11, 11));
    Ok(())
}

#[tokio::test]
async fn empty_graph_is_done_immediately() -> TestResult {
    let clock: Arc<dyn Clock> = Arc::new(SteppingClock::per_second());
    let graph = Graph::new(Vec::new(), clock.as_ref())?;
    let (handle, _join) = Runtime::spawn(CoreRuntime::new("empty", graph, clock), None);

    with_timeout(handle.wait_until_done()).await?;
    let summary = handle.summary().await?;
    assert_eq!(summary.state, InstanceState::Completed);
    assert_eq!(summary.create_time, None);
    assert!(handle.next_ready_step().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn handle_reports_closed_engine() -> TestResult {
    let (handle, join) = Runtime::spawn(pizza_core("order-3"), None);
    join.abort();
    let _ = join.await;

    assert!(matches!(
        handle.all_done().await,
        Err(StepgraphError::EngineClosed)
    ));
    assert!(matches!(
        handle.wait_until_done().await,
        Err(StepgraphError::EngineClosed)
    ));
    Ok(())
}
