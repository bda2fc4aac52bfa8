// src/dag/completion.rs

//! Result type for a single accepted `complete` call.

use serde::Serialize;

use crate::types::StepName;

/// What changed when a step was completed.
///
/// Hosts use this to log or publish transitions without diffing snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStep {
    /// The step that moved to `Done`.
    pub completed: StepName,
    /// Steps that moved from `Blocked` to `Ready`, in declaration order.
    pub newly_ready: Vec<StepName>,
    /// Whether every step in the graph is now `Done`.
    pub all_done: bool,
}
