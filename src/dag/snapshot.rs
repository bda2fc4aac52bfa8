// src/dag/snapshot.rs

//! Lossless projection of a graph into plain records, and back.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dag::graph::Graph;
use crate::dag::state_manager::ReadOnlyStateManager;
use crate::dag::step::Step;
use crate::dag::validate::{IntegrityViolation, build_adjacency};
use crate::errors::CorruptSnapshot;
use crate::types::{StepName, StepState, Timestamp};

/// Persisted shape of one step.
///
/// ```json
/// {
///   "id": "MakeDough",
///   "state": "READY",
///   "dependsOn": ["Payment"],
///   "updateTime": "2025-01-01T09:01:00Z",
///   "completeTime": null
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub id: StepName,
    pub state: StepState,
    #[serde(default)]
    pub depends_on: Vec<StepName>,
    pub update_time: Timestamp,
    #[serde(default)]
    pub complete_time: Option<Timestamp>,
}

impl From<&Step> for StepRecord {
    fn from(step: &Step) -> Self {
        Self {
            id: step.id().to_string(),
            state: step.state(),
            depends_on: step.depends_on().to_vec(),
            update_time: step.update_time(),
            complete_time: step.complete_time(),
        }
    }
}

impl Graph {
    /// Ordered records describing every step, in declaration order.
    pub fn snapshot(&self) -> Vec<StepRecord> {
        self.steps().map(StepRecord::from).collect()
    }

    /// Rebuild a graph from records produced by [`Graph::snapshot`].
    ///
    /// Edges are trusted to be acyclic and are not re-validated. Duplicate
    /// ids, dangling references, and states that disagree with the states of
    /// their dependencies are reported as [`CorruptSnapshot`].
    pub fn restore(
        records: impl IntoIterator<Item = StepRecord>,
    ) -> Result<Graph, CorruptSnapshot> {
        let records: Vec<StepRecord> = records.into_iter().collect();

        let adjacency = {
            let entries: Vec<(&str, &[StepName])> = records
                .iter()
                .map(|r| (r.id.as_str(), r.depends_on.as_slice()))
                .collect();

            build_adjacency(&entries).map_err(|violation| {
                warn!(?violation, "refusing to restore snapshot");
                match violation {
                    IntegrityViolation::DuplicateId(id) => CorruptSnapshot::DuplicateId(id),
                    IntegrityViolation::UnknownReference { step, dependency } => {
                        CorruptSnapshot::DanglingDependency { step, dependency }
                    }
                }
            })?
        };

        let ids: Vec<StepName> = records.iter().map(|r| r.id.clone()).collect();
        let steps: Vec<Step> = records
            .into_iter()
            .zip(adjacency.deps.iter())
            .map(|(record, deps)| {
                let depends_on = deps.iter().map(|&d| ids[d].clone()).collect();
                Step::new(
                    record.id,
                    record.state,
                    depends_on,
                    record.update_time,
                    record.complete_time,
                )
            })
            .collect();

        check_states(&steps, &adjacency.deps)?;

        let graph = Graph::from_parts(steps, adjacency);
        debug!(steps = graph.len(), "step graph restored from snapshot");
        Ok(graph)
    }
}

fn check_states(steps: &[Step], deps: &[Vec<usize>]) -> Result<(), CorruptSnapshot> {
    let ro = ReadOnlyStateManager::new(steps, deps);

    for (idx, step) in steps.iter().enumerate() {
        let reason = match (step.state(), step.complete_time()) {
            (StepState::Done, None) => Some("done without a completion time"),
            (StepState::Blocked | StepState::Ready, Some(_)) => {
                Some("completion time set on an unfinished step")
            }
            (StepState::Done, Some(_)) if !ro.deps_satisfied(idx) => {
                Some("done before all of its dependencies")
            }
            (StepState::Done, Some(_)) => None,
            (pending, None) if pending != ro.expected_pending_state(idx) => Some(match pending {
                StepState::Ready => "ready while a dependency is unfinished",
                _ => "blocked although every dependency is done",
            }),
            _ => None,
        };

        if let Some(reason) = reason {
            warn!(step = %step.id(), reason, "refusing to restore snapshot");
            return Err(CorruptSnapshot::InconsistentState {
                step: step.id().to_string(),
                reason: reason.to_string(),
            });
        }
    }

    Ok(())
}
