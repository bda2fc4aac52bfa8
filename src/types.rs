use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical step identifier used throughout the crate.
pub type StepName = String;

/// Point in time recorded on step transitions.
pub type Timestamp = DateTime<Utc>;

/// Lifecycle state of a single step.
///
/// - `Blocked`: at least one dependency is not `Done` yet.
/// - `Ready`: every dependency is `Done`; the step is workable now.
/// - `Done`: terminal.
///
/// The only transitions are `Blocked -> Ready -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepState {
    Blocked,
    Ready,
    Done,
}

impl StepState {
    pub fn as_str(self) -> &'static str {
        match self {
            StepState::Blocked => "BLOCKED",
            StepState::Ready => "READY",
            StepState::Done => "DONE",
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a whole task instance, as tracked by the host shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    InProgress,
    Completed,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InstanceState::InProgress => "IN_PROGRESS",
            InstanceState::Completed => "COMPLETED",
        })
    }
}

/// Where instance snapshots are kept between process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// One JSON file per instance under the snapshot directory.
    File,
    /// In-process only (lost on exit).
    Memory,
}

impl Default for StorageMode {
    fn default() -> Self {
        StorageMode::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_state_serializes_as_screaming_tag() {
        let json = serde_json::to_string(&StepState::Blocked).unwrap();
        assert_eq!(json, "\"BLOCKED\"");
        let back: StepState = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(back, StepState::Done);
    }
}
