// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile, TaskSpec};
use crate::engine::{DEFAULT_POLL_INTERVAL, SchedulerConfig};
use crate::errors::{Result, RundagError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RundagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        let scheduler = validate_scheduler_section(&raw.config)?;
        let task = validate_tasks(&raw)?;
        Ok(ConfigFile::new_unchecked(scheduler, task))
    }
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(RundagError::ConfigError(
            "task file must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_scheduler_section(section: &ConfigSection) -> Result<SchedulerConfig> {
    if section.workers == 0 {
        return Err(RundagError::ConfigError(
            "[config].workers must be >= 1 (got 0)".to_string(),
        ));
    }

    if section.queue_capacity == Some(0) {
        return Err(RundagError::ConfigError(
            "[config].queue_capacity must be >= 1 (got 0)".to_string(),
        ));
    }

    let poll_interval = match &section.poll_interval {
        Some(s) => {
            let interval = duration_field("[config].poll_interval", s)?;
            if interval.is_zero() {
                return Err(RundagError::ConfigError(
                    "[config].poll_interval must be greater than zero".to_string(),
                ));
            }
            interval
        }
        None => DEFAULT_POLL_INTERVAL,
    };

    let task_timeout = section
        .task_timeout
        .as_deref()
        .map(|s| duration_field("[config].task_timeout", s))
        .transpose()?;

    Ok(SchedulerConfig {
        workers: section.workers,
        queue_capacity: section.queue_capacity,
        poll_interval,
        task_timeout,
    })
}

/// Per-task checks. Unknown dependencies and cycles are deliberately left
/// alone: the scheduler reports them as blocked tasks or a deadlock.
fn validate_tasks(cfg: &RawConfigFile) -> Result<BTreeMap<String, TaskSpec>> {
    let mut out = BTreeMap::new();

    for (name, task) in cfg.task.iter() {
        if name.trim().is_empty() {
            return Err(RundagError::ConfigError(
                "task names must not be empty".to_string(),
            ));
        }
        if task.cmd.trim().is_empty() {
            return Err(RundagError::ConfigError(format!(
                "task '{name}' has an empty `cmd`"
            )));
        }
        if task.after.iter().any(|dep| dep == name) {
            return Err(RundagError::ConfigError(format!(
                "task '{name}' cannot depend on itself in `after`"
            )));
        }

        let timeout = task
            .timeout
            .as_deref()
            .map(|s| duration_field(&format!("[task.{name}].timeout"), s))
            .transpose()?;

        let mut after = task.after.clone();
        after.sort();
        after.dedup();

        out.insert(
            name.clone(),
            TaskSpec {
                cmd: task.cmd.clone(),
                after,
                timeout,
            },
        );
    }

    Ok(out)
}

fn duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| RundagError::ConfigError(format!("{field}: {e}")))
}
