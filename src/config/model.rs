// src/config/model.rs

use serde::Deserialize;

use crate::dag::StepDef;
use crate::types::StorageMode;

/// Step graph definition as read from a TOML file, before validation.
///
/// ```toml
/// [graph]
/// name = "pizza-order"
/// storage = "file"
///
/// [[step]]
/// name = "Payment"
///
/// [[step]]
/// name = "MakeDough"
/// after = ["Payment"]
/// ```
///
/// Steps are an array of tables so that declaration order survives parsing;
/// that order decides which ready step is offered first.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub graph: GraphSection,

    #[serde(default, rename = "step")]
    pub steps: Vec<StepConfig>,
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub graph: GraphSection,
    pub steps: Vec<StepConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(graph: GraphSection, steps: Vec<StepConfig>) -> Self {
        Self { graph, steps }
    }

    /// Step definitions in declaration order.
    pub fn step_defs(&self) -> Vec<StepDef> {
        self.steps.iter().map(StepConfig::to_def).collect()
    }

    pub fn step(&self, name: &str) -> Option<&StepConfig> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// `[graph]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphSection {
    /// Default instance name; also the snapshot file stem.
    #[serde(default = "default_graph_name")]
    pub name: String,

    /// `"file"` (default) or `"memory"`.
    #[serde(default)]
    pub storage: StorageMode,

    /// Snapshot directory, relative to the config file's directory.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
}

fn default_graph_name() -> String {
    "default".to_string()
}

fn default_snapshot_dir() -> String {
    ".stepgraph".to_string()
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            name: default_graph_name(),
            storage: StorageMode::default(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

/// `[[step]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    pub name: String,

    /// Steps that must be done before this one becomes ready.
    #[serde(default)]
    pub after: Vec<String>,

    /// Free-form text shown in dry-run output.
    #[serde(default)]
    pub description: Option<String>,
}

impl StepConfig {
    pub fn to_def(&self) -> StepDef {
        StepDef::new(self.name.clone(), self.after.iter().cloned())
    }
}
