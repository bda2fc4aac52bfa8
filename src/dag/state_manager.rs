// src/dag/state_manager.rs

//! State transitions for steps inside a graph.

use tracing::debug;

use crate::dag::step::Step;
use crate::types::{StepName, StepState, Timestamp};

/// Applies state transitions to a graph's steps.
///
/// Holds the step list mutably plus the (immutable) forward and reverse
/// adjacency, so that every transition can check its own preconditions.
pub(crate) struct StateManager<'a> {
    steps: &'a mut [Step],
    deps: &'a [Vec<usize>],
    dependents: &'a [Vec<usize>],
}

impl<'a> StateManager<'a> {
    pub(crate) fn new(
        steps: &'a mut [Step],
        deps: &'a [Vec<usize>],
        dependents: &'a [Vec<usize>],
    ) -> Self {
        Self {
            steps,
            deps,
            dependents,
        }
    }

    /// Move a `Ready` step to `Done`.
    ///
    /// The caller has already checked the precondition; this only asserts it.
    pub(crate) fn mark_done(&mut self, idx: usize, now: Timestamp) {
        let step = &mut self.steps[idx];
        debug_assert_eq!(step.state(), StepState::Ready);
        step.mark_done(now);
        debug!(step = %step.id(), "step Ready -> Done");
    }

    /// Promote the direct dependents of `completed` whose dependencies are
    /// now all `Done`.
    ///
    /// Only direct dependents can change: anything further downstream still
    /// waits on an intermediate step that is not `Done`. Returns the promoted
    /// ids in declaration order.
    pub(crate) fn promote_ready_dependents(
        &mut self,
        completed: usize,
        now: Timestamp,
    ) -> Vec<StepName> {
        // Decide first, then mutate.
        let candidates: Vec<usize> = {
            let ro = ReadOnlyStateManager::new(&*self.steps, self.deps);
            self.dependents[completed]
                .iter()
                .copied()
                .filter(|&idx| {
                    self.steps[idx].state() == StepState::Blocked && ro.deps_satisfied(idx)
                })
                .collect()
        };

        let mut promoted = Vec::with_capacity(candidates.len());
        for idx in candidates {
            let step = &mut self.steps[idx];
            step.mark_ready(now);
            debug!(step = %step.id(), "dependencies satisfied; step Blocked -> Ready");
            promoted.push(step.id().to_string());
        }

        promoted
    }
}

/// Shared-reference view used for dependency checks.
pub(crate) struct ReadOnlyStateManager<'a> {
    steps: &'a [Step],
    deps: &'a [Vec<usize>],
}

impl<'a> ReadOnlyStateManager<'a> {
    pub(crate) fn new(steps: &'a [Step], deps: &'a [Vec<usize>]) -> Self {
        Self { steps, deps }
    }

    /// Whether every dependency of step `idx` is `Done`.
    pub(crate) fn deps_satisfied(&self, idx: usize) -> bool {
        self.deps[idx].iter().all(|&dep| self.steps[dep].is_done())
    }

    /// The state step `idx` must be in given its dependencies, unless it is
    /// already `Done`.
    pub(crate) fn expected_pending_state(&self, idx: usize) -> StepState {
        if self.deps_satisfied(idx) {
            StepState::Ready
        } else {
            StepState::Blocked
        }
    }
}
