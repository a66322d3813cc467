// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Task file used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Rundag.toml";

/// Deserialize a task file from TOML text. No semantic checks.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    Ok(toml::from_str(contents)?)
}

/// Read and deserialize the task file at `path`. No semantic checks; see
/// [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading task file");
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Read the task file at `path` and turn it into scheduler settings and
/// task specs.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = ConfigFile::try_from(load_from_path(path)?)?;
    debug!(
        tasks = config.task.len(),
        workers = config.scheduler.workers,
        "task file validated"
    );
    Ok(config)
}
