// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::dag::completion::CompletionStep;
use crate::dag::state_manager::StateManager;
use crate::dag::step::{Step, StepDef};
use crate::dag::validate::{Adjacency, check_defs};
use crate::errors::{ConstructionError, MutationError, QueryError};
use crate::types::{StepName, StepState};

/// Dependency-gated task graph.
///
/// The step set and edges are fixed at construction. Only step states and
/// timestamps change afterwards, and only through [`Graph::complete`].
///
/// `Clone` is a deep copy: steps, dependency lists and timestamps are all
/// owned, so a clone can be read while the original keeps mutating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    /// Steps in declaration order.
    steps: Vec<Step>,
    index: HashMap<StepName, usize>,
    /// Direct dependencies by step index.
    deps: Vec<Vec<usize>>,
    /// Direct dependents by step index, in declaration order.
    dependents: Vec<Vec<usize>>,
    done_count: usize,
}

impl Graph {
    /// Build a graph from step definitions.
    ///
    /// Fails with the first of: a duplicate id, a dependency on an unknown
    /// step, a dependency cycle. Steps without dependencies start `Ready`,
    /// the rest start `Blocked`; all share one clock reading as update time.
    pub fn new(
        defs: impl IntoIterator<Item = StepDef>,
        clock: &dyn Clock,
    ) -> Result<Self, ConstructionError> {
        let defs: Vec<StepDef> = defs.into_iter().collect();
        let adjacency = check_defs(&defs)?;
        let now = clock.now();

        let steps = defs
            .into_iter()
            .zip(adjacency.deps.iter())
            .map(|(def, deps)| {
                let state = if deps.is_empty() {
                    StepState::Ready
                } else {
                    StepState::Blocked
                };
                let depends_on = def.unique_deps().into_iter().map(str::to_string).collect();
                Step::new(def.id, state, depends_on, now, None)
            })
            .collect();

        let graph = Self::from_parts(steps, adjacency);
        info!(
            steps = graph.len(),
            ready = graph.ready_steps().count(),
            "step graph constructed"
        );
        Ok(graph)
    }

    /// Assemble a graph from already checked parts, deriving the reverse
    /// index and the done counter.
    pub(super) fn from_parts(steps: Vec<Step>, adjacency: Adjacency) -> Self {
        let Adjacency { index, deps } = adjacency;

        let mut dependents = vec![Vec::new(); steps.len()];
        for (idx, step_deps) in deps.iter().enumerate() {
            for &dep in step_deps {
                dependents[dep].push(idx);
            }
        }

        let done_count = steps.iter().filter(|s| s.is_done()).count();

        Self {
            steps,
            index,
            deps,
            dependents,
            done_count,
        }
    }

    /// Mark a `Ready` step as `Done` and promote the dependents it unblocks.
    ///
    /// On error nothing is changed. The clock is read once; that reading
    /// stamps the completed step and every promoted step.
    pub fn complete(
        &mut self,
        id: &str,
        clock: &dyn Clock,
    ) -> Result<CompletionStep, MutationError> {
        let Some(&idx) = self.index.get(id) else {
            warn!(step = %id, "complete called for unknown step");
            return Err(MutationError::NotFound(id.to_string()));
        };

        let state = self.steps[idx].state();
        if state != StepState::Ready {
            warn!(step = %id, state = %state, "complete rejected; step is not Ready");
            return Err(MutationError::InvalidTransition {
                step: id.to_string(),
                state,
            });
        }

        let now = clock.now();
        let mut manager = StateManager::new(&mut self.steps, &self.deps, &self.dependents);
        manager.mark_done(idx, now);
        let newly_ready = manager.promote_ready_dependents(idx, now);
        self.done_count += 1;

        let all_done = self.all_done();
        debug!(step = %id, ?newly_ready, all_done, "step completed");
        if all_done {
            info!("all steps done");
        }

        Ok(CompletionStep {
            completed: id.to_string(),
            newly_ready,
            all_done,
        })
    }

    pub fn get_step(&self, id: &str) -> Result<&Step, QueryError> {
        self.index
            .get(id)
            .map(|&idx| &self.steps[idx])
            .ok_or_else(|| QueryError::NotFound(id.to_string()))
    }

    /// First `Ready` step in declaration order.
    pub fn next_ready_step(&self) -> Option<&Step> {
        self.steps.iter().find(|s| s.is_ready())
    }

    /// True iff every step is `Done`. An empty graph is all done.
    pub fn all_done(&self) -> bool {
        self.done_count == self.steps.len()
    }

    /// All steps in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    pub fn ready_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.is_ready())
    }

    /// Steps that list `id` as a direct dependency, in declaration order.
    pub fn dependents_of(&self, id: &str) -> Result<Vec<&str>, QueryError> {
        let idx = self
            .index
            .get(id)
            .ok_or_else(|| QueryError::NotFound(id.to_string()))?;
        Ok(self.dependents[*idx]
            .iter()
            .map(|&d| self.steps[d].id())
            .collect())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `(done, total)` step counts.
    pub fn progress(&self) -> (usize, usize) {
        (self.done_count, self.steps.len())
    }

    /// A topological order of the step ids (every step after all of its
    /// dependencies).
    ///
    /// Graphs built with [`Graph::new`] are always acyclic. A graph restored
    /// from a tampered snapshot may not be, in which case this reports the
    /// cycle.
    pub fn execution_order(&self) -> Result<Vec<&str>, ConstructionError> {
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();

        for idx in 0..self.steps.len() {
            graph.add_node(idx);
        }
        // Edge direction: dependency -> dependent.
        for (idx, step_deps) in self.deps.iter().enumerate() {
            for &dep in step_deps {
                graph.add_edge(dep, idx, ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(|idx| self.steps[idx].id()).collect()),
            Err(cycle) => Err(ConstructionError::CycleDetected(
                self.steps[cycle.node_id()].id().to_string(),
            )),
        }
    }

    /// Whether this graph has exactly the step set and edges described by
    /// `defs`, in the same order. States and timestamps are not compared.
    pub fn matches_definition(&self, defs: &[StepDef]) -> bool {
        self.steps.len() == defs.len()
            && self.steps.iter().zip(defs).all(|(step, def)| {
                step.id() == def.id
                    && step
                        .depends_on()
                        .iter()
                        .map(String::as_str)
                        .eq(def.unique_deps())
            })
    }
}
