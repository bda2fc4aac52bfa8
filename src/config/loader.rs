// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and parse a config file into a [`RawConfigFile`].
///
/// Only TOML deserialization happens here; see [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), steps = config.steps.len(), "parsed config");

    Ok(config)
}

/// Load a config file and validate it.
///
/// - Reads TOML.
/// - Applies defaults (via `serde` + `Default` impls).
/// - Checks for blank names, duplicate steps, unknown `after` references and
///   dependency cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Config file looked up in the current working directory by default.
pub const DEFAULT_CONFIG_FILE: &str = "Steps.toml";
