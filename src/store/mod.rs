// src/store/mod.rs

//! Persistence for graph snapshots between process runs.
//!
//! The graph itself never touches storage. Hosts save the output of
//! [`Graph::snapshot`](crate::dag::Graph::snapshot) after each accepted
//! completion and feed it back to `Graph::restore` on the next start.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::dag::StepRecord;
use crate::errors::{Result, StepgraphError};
use crate::types::{StorageMode, Timestamp};

pub mod file;

pub use file::FileSnapshotStore;

/// Everything persisted for one instance.
///
/// ```json
/// {
///   "createTime": "2025-01-01T09:00:00Z",
///   "steps": [ { "id": "Payment", "state": "DONE", ... } ]
/// }
/// ```
///
/// The creation time is stored on its own: once every step has left its
/// initial state no step timestamp carries it any more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredInstance {
    #[serde(default)]
    pub create_time: Option<Timestamp>,
    pub steps: Vec<StepRecord>,
}

/// Abstract storage for instance snapshots, keyed by instance name.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, instance: &str) -> Result<Option<StoredInstance>>;
    fn save(&mut self, instance: &str, stored: &StoredInstance) -> Result<()>;
    /// Forget the instance. Returns whether anything was stored.
    fn remove(&mut self, instance: &str) -> Result<bool>;
}

/// Keeps snapshots in memory only.
///
/// Clones share the same map, so a test can hand one clone to a runtime and
/// inspect what was saved through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    map: Arc<Mutex<HashMap<String, StoredInstance>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredInstance>> {
        self.map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, instance: &str) -> Result<Option<StoredInstance>> {
        Ok(self.lock().get(instance).cloned())
    }

    fn save(&mut self, instance: &str, stored: &StoredInstance) -> Result<()> {
        self.lock().insert(instance.to_string(), stored.clone());
        debug!(instance = %instance, steps = stored.steps.len(), "stored snapshot (memory)");
        Ok(())
    }

    fn remove(&mut self, instance: &str) -> Result<bool> {
        let removed = self.lock().remove(instance).is_some();
        if removed {
            info!(instance = %instance, "removed snapshot (memory)");
        }
        Ok(removed)
    }
}

/// Instance names become file names for the file store, so anything that
/// could escape the snapshot directory is refused.
pub fn check_instance_name(instance: &str) -> Result<()> {
    let valid = !instance.is_empty()
        && !instance.starts_with('.')
        && instance
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if !valid {
        return Err(StepgraphError::ConfigError(format!(
            "invalid instance name '{instance}' (use letters, digits, '-', '_' or '.')"
        )));
    }
    Ok(())
}

/// Build the store selected by `[graph].storage`.
///
/// `config_root` is the directory `[graph].snapshot_dir` is relative to.
pub fn open_store(cfg: &ConfigFile, config_root: &Path) -> Box<dyn SnapshotStore> {
    match cfg.graph.storage {
        StorageMode::File => Box::new(FileSnapshotStore::new(
            config_root.join(&cfg.graph.snapshot_dir),
        )),
        StorageMode::Memory => Box::new(MemorySnapshotStore::new()),
    }
}
