#![allow(dead_code)]

use stepgraph::config::{ConfigFile, GraphSection, RawConfigFile, StepConfig};
use stepgraph::dag::StepDef;
use stepgraph::types::StorageMode;

/// Builder for ordered `StepDef` lists.
///
/// ```ignore
/// let defs = StepDefsBuilder::new()
///     .root("A")
///     .step("B", &["A"])
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct StepDefsBuilder {
    defs: Vec<StepDef>,
}

impl StepDefsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, id: &str) -> Self {
        self.defs.push(StepDef::root(id));
        self
    }

    pub fn step(mut self, id: &str, after: &[&str]) -> Self {
        self.defs.push(StepDef::new(id, after.iter().copied()));
        self
    }

    /// Linear chain `ids[0] -> ids[1] -> ...`.
    pub fn chain(mut self, ids: &[&str]) -> Self {
        for (i, id) in ids.iter().enumerate() {
            self = match i {
                0 => self.root(id),
                _ => self.step(id, &[ids[i - 1]]),
            };
        }
        self
    }

    pub fn build(self) -> Vec<StepDef> {
        self.defs
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                graph: GraphSection {
                    storage: StorageMode::Memory,
                    ..GraphSection::default()
                },
                steps: Vec::new(),
            },
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.config.graph.name = name.to_string();
        self
    }

    pub fn with_storage(mut self, storage: StorageMode) -> Self {
        self.config.graph.storage = storage;
        self
    }

    pub fn with_step(mut self, name: &str, after: &[&str]) -> Self {
        self.config.steps.push(StepConfig {
            name: name.to_string(),
            after: after.iter().map(|s| s.to_string()).collect(),
            description: None,
        });
        self
    }

    /// The unvalidated config, for tests that expect validation to fail.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
