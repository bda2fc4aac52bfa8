// src/store/file.rs

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{SnapshotStore, StoredInstance, check_instance_name};
use crate::errors::Result;

/// Stores each instance as `<dir>/<instance>.json`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for `instance`.
    pub fn path_for(&self, instance: &str) -> Result<PathBuf> {
        check_instance_name(instance)?;
        Ok(self.dir.join(format!("{instance}.json")))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, instance: &str) -> Result<Option<StoredInstance>> {
        let path = self.path_for(instance)?;

        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let stored: StoredInstance = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), steps = stored.steps.len(), "loaded snapshot (file)");
        Ok(Some(stored))
    }

    fn save(&mut self, instance: &str, stored: &StoredInstance) -> Result<()> {
        let path = self.path_for(instance)?;
        fs::create_dir_all(&self.dir)?;

        // Write next to the target and rename, so a crash mid-write never
        // leaves a truncated snapshot behind.
        let tmp = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, stored)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), steps = stored.steps.len(), "stored snapshot (file)");
        Ok(())
    }

    fn remove(&mut self, instance: &str) -> Result<bool> {
        let path = self.path_for(instance)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!(path = %path.display(), "removed snapshot (file)");
        Ok(true)
    }
}
