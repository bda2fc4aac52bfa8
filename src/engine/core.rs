// src/engine/core.rs

//! Pure request handler.
//!
//! `CoreRuntime` has no channels, no Tokio types and performs no IO, so the
//! instance semantics can be unit tested directly.

use std::sync::Arc;

use tracing::info;

use crate::clock::Clock;
use crate::dag::Graph;
use crate::engine::{InstanceSummary, Request, Response};
use crate::errors::Result;
use crate::store::StoredInstance;
use crate::types::{InstanceState, Timestamp};

/// Owns one graph plus the bookkeeping for the task instance it belongs to.
#[derive(Debug)]
pub struct CoreRuntime {
    instance: String,
    graph: Graph,
    clock: Arc<dyn Clock>,
    state: InstanceState,
    create_time: Option<Timestamp>,
    update_time: Option<Timestamp>,
}

impl CoreRuntime {
    /// Wrap a freshly built graph.
    ///
    /// Creation time is the construction stamp shared by every step, last
    /// update is the latest step update. An empty graph has neither.
    pub fn new(instance: impl Into<String>, graph: Graph, clock: Arc<dyn Clock>) -> Self {
        let create_time = graph.steps().map(|s| s.update_time()).min();
        let update_time = graph.steps().map(|s| s.update_time()).max();

        Self {
            instance: instance.into(),
            state: instance_state(&graph),
            graph,
            clock,
            create_time,
            update_time,
        }
    }

    /// Wrap a graph restored from a [`StoredInstance`], keeping the
    /// persisted creation time.
    ///
    /// Stored instances without a creation time fall back to the earliest
    /// step update.
    pub fn restore(
        instance: impl Into<String>,
        graph: Graph,
        clock: Arc<dyn Clock>,
        create_time: Option<Timestamp>,
    ) -> Self {
        let mut core = Self::new(instance, graph, clock);
        if create_time.is_some() {
            core.create_time = create_time;
        }
        core
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn create_time(&self) -> Option<Timestamp> {
        self.create_time
    }

    /// What a store needs to bring this instance back later.
    pub fn stored_instance(&self) -> StoredInstance {
        StoredInstance {
            create_time: self.create_time,
            steps: self.graph.snapshot(),
        }
    }

    /// Handle a single request, mutating the graph for `Complete`.
    pub fn handle(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::Complete(id) => {
                let step = self.graph.complete(&id, self.clock.as_ref())?;
                self.update_time = self.graph.get_step(&id)?.update_time().into();

                let state = instance_state(&self.graph);
                if state != self.state {
                    info!(instance = %self.instance, "instance completed");
                    self.state = state;
                }

                Ok(Response::Completed(step))
            }
            Request::GetStep(id) => Ok(Response::Step(self.graph.get_step(&id)?.clone())),
            Request::NextReadyStep => Ok(Response::NextReady(
                self.graph.next_ready_step().cloned(),
            )),
            Request::AllDone => Ok(Response::AllDone(self.graph.all_done())),
            Request::Snapshot => Ok(Response::Snapshot(self.graph.snapshot())),
            Request::Summary => Ok(Response::Summary(self.summary())),
        }
    }

    pub fn summary(&self) -> InstanceSummary {
        let (done, total) = self.graph.progress();
        InstanceSummary {
            instance: self.instance.clone(),
            state: self.state,
            create_time: self.create_time,
            update_time: self.update_time,
            done,
            total,
            steps: self.graph.snapshot(),
        }
    }
}

fn instance_state(graph: &Graph) -> InstanceState {
    if graph.all_done() {
        InstanceState::Completed
    } else {
        InstanceState::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ReplayClock;
    use crate::dag::templates::pizza_order;
    use crate::errors::{MutationError, StepgraphError};
    use crate::types::StepState;
    use chrono::{Duration, TimeZone, Utc};

    fn core() -> CoreRuntime {
        let start = Utc.with_ymd_and_hms(2025, 2, 14, 19, 0, 0).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(ReplayClock::new(
            (0..6).map(move |i| start + Duration::minutes(10 * i)),
        ));
        let graph = Graph::new(pizza_order(), clock.as_ref()).unwrap();
        CoreRuntime::new("order-1", graph, clock)
    }

    #[test]
    fn completes_order_and_flips_instance_state() {
        let mut core = core();
        assert_eq!(core.state(), InstanceState::InProgress);
        let created = core.summary().create_time;

        for step in ["Payment", "MakeDough", "AddToppings", "BakePizza", "Deliver"] {
            let response = core.handle(Request::Complete(step.to_string())).unwrap();
            assert!(matches!(response, Response::Completed(_)));
        }

        let summary = core.summary();
        assert_eq!(summary.state, InstanceState::Completed);
        assert_eq!((summary.done, summary.total), (5, 5));
        assert_eq!(summary.create_time, created);
        assert_eq!(
            summary.update_time,
            Some(Utc.with_ymd_and_hms(2025, 2, 14, 19, 50, 0).unwrap())
        );
    }

    #[test]
    fn rejected_request_surfaces_typed_error() {
        let mut core = core();
        let err = core
            .handle(Request::Complete("Deliver".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            StepgraphError::Mutation(MutationError::InvalidTransition {
                state: StepState::Blocked,
                ..
            })
        ));
        assert!(matches!(
            core.handle(Request::GetStep("Tip".to_string())),
            Err(StepgraphError::Query(_))
        ));
    }

    #[test]
    fn read_requests_do_not_mutate() {
        let mut core = core();
        let before = core.graph().clone();

        let next = core.handle(Request::NextReadyStep).unwrap();
        assert!(matches!(next, Response::NextReady(Some(ref s)) if s.id() == "Payment"));
        assert_eq!(
            core.handle(Request::AllDone).unwrap(),
            Response::AllDone(false)
        );
        core.handle(Request::Snapshot).unwrap();

        assert_eq!(core.graph(), &before);
    }

    #[test]
    fn restored_instance_keeps_creation_time_after_every_step_moved() {
        let mut core = core();
        for step in ["Payment", "MakeDough", "AddToppings", "BakePizza"] {
            core.handle(Request::Complete(step.to_string())).unwrap();
        }
        let before = core.summary();
        assert_eq!(
            before.create_time,
            Some(Utc.with_ymd_and_hms(2025, 2, 14, 19, 0, 0).unwrap())
        );

        // No step still carries the construction stamp.
        let stored = core.stored_instance();
        assert!(stored.steps.iter().all(|r| Some(r.update_time) != before.create_time));

        let graph = Graph::restore(stored.steps).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(ReplayClock::new([]));
        let restored = CoreRuntime::restore("order-1", graph, clock, stored.create_time);

        assert_eq!(restored.summary(), before);
    }
}
