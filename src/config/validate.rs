// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::validate_defs;
use crate::errors::{Result, StepgraphError};
use crate::store::check_instance_name;
use crate::types::StorageMode;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = StepgraphError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.graph, raw.steps))
    }
}

/// Check a parsed config without consuming it.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_steps(cfg)?;
    validate_graph_section(cfg)?;
    validate_step_names(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_steps(cfg: &RawConfigFile) -> Result<()> {
    if cfg.steps.is_empty() {
        return Err(StepgraphError::ConfigError(
            "config must contain at least one [[step]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_graph_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.graph.name.trim().is_empty() {
        return Err(StepgraphError::ConfigError(
            "[graph].name must not be blank".to_string(),
        ));
    }
    if cfg.graph.snapshot_dir.trim().is_empty() {
        return Err(StepgraphError::ConfigError(
            "[graph].snapshot_dir must not be blank".to_string(),
        ));
    }
    // File storage names the default instance's snapshot file after the graph.
    if cfg.graph.storage == StorageMode::File {
        check_instance_name(&cfg.graph.name)?;
    }
    Ok(())
}

fn validate_step_names(cfg: &RawConfigFile) -> Result<()> {
    for (pos, step) in cfg.steps.iter().enumerate() {
        if step.name.trim().is_empty() {
            return Err(StepgraphError::ConfigError(format!(
                "[[step]] #{} has a blank name",
                pos + 1
            )));
        }
    }
    Ok(())
}

/// Duplicate names, unknown `after` references and cycles are reported as
/// the graph's own construction errors.
fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let defs: Vec<_> = cfg.steps.iter().map(|s| s.to_def()).collect();
    validate_defs(&defs)?;
    Ok(())
}
