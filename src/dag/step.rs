// src/dag/step.rs

//! Step definitions (input shape) and steps (owned, stateful view).

use serde::{Deserialize, Serialize};

use crate::types::{StepName, StepState, Timestamp};

/// Declaration of a step: its id and the steps it waits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDef {
    pub id: StepName,
    #[serde(default)]
    pub depends_on: Vec<StepName>,
}

impl StepDef {
    pub fn new<I, S>(id: impl Into<StepName>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StepName>,
    {
        Self {
            id: id.into(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
        }
    }

    /// A step with no dependencies.
    pub fn root(id: impl Into<StepName>) -> Self {
        Self {
            id: id.into(),
            depends_on: Vec::new(),
        }
    }

    /// Dependencies with repeats removed, first occurrence order kept.
    pub fn unique_deps(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.depends_on.len());
        for dep in &self.depends_on {
            if !seen.contains(&dep.as_str()) {
                seen.push(dep.as_str());
            }
        }
        seen
    }
}

/// A step owned by a [`Graph`](crate::dag::Graph).
///
/// Callers only ever see shared references; state changes go through the
/// graph so the dependency invariants cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    id: StepName,
    state: StepState,
    depends_on: Vec<StepName>,
    update_time: Timestamp,
    complete_time: Option<Timestamp>,
}

impl Step {
    pub(crate) fn new(
        id: StepName,
        state: StepState,
        depends_on: Vec<StepName>,
        update_time: Timestamp,
        complete_time: Option<Timestamp>,
    ) -> Self {
        Self {
            id,
            state,
            depends_on,
            update_time,
            complete_time,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    pub fn depends_on(&self) -> &[StepName] {
        &self.depends_on
    }

    pub fn update_time(&self) -> Timestamp {
        self.update_time
    }

    pub fn complete_time(&self) -> Option<Timestamp> {
        self.complete_time
    }

    pub fn is_ready(&self) -> bool {
        self.state == StepState::Ready
    }

    pub fn is_done(&self) -> bool {
        self.state == StepState::Done
    }

    pub(crate) fn mark_ready(&mut self, now: Timestamp) {
        self.state = StepState::Ready;
        self.update_time = now;
    }

    pub(crate) fn mark_done(&mut self, now: Timestamp) {
        self.state = StepState::Done;
        self.update_time = now;
        self.complete_time = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_deps_keeps_first_occurrence_order() {
        let def = StepDef::new("C", ["B", "A", "B", "A"]);
        assert_eq!(def.unique_deps(), vec!["B", "A"]);
    }

    #[test]
    fn step_def_deserializes_without_depends_on() {
        let def: StepDef = serde_json::from_str(r#"{"id":"Payment"}"#).unwrap();
        assert_eq!(def, StepDef::root("Payment"));
    }
}
