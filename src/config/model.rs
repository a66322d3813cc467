// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::dag::{DependencyGraph, Task};
use crate::engine::{DEFAULT_WORKERS, SchedulerConfig};
use crate::exec::shell_body;

/// Task file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// workers = 2
/// queue_capacity = 2
/// poll_interval = "100ms"
/// task_timeout = "30s"
///
/// [task.fetch]
/// cmd = "git fetch"
///
/// [task.build]
/// cmd = "cargo build"
/// after = ["fetch"]
/// timeout = "5m"
/// ```
///
/// All sections are optional at parse time; validation requires at least
/// one task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Scheduler settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task id.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Number of concurrent workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the work channel. Defaults to `workers`.
    #[serde(default)]
    pub queue_capacity: Option<usize>,

    /// Fallback scan tick, e.g. `"100ms"`.
    #[serde(default)]
    pub poll_interval: Option<String>,

    /// Default per-task timeout, e.g. `"30s"`.
    #[serde(default)]
    pub task_timeout: Option<String>,
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: None,
            poll_interval: None,
            task_timeout: None,
        }
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command to run.
    pub cmd: String,

    /// Tasks that must complete before this one starts.
    #[serde(default)]
    pub after: Vec<String>,

    /// Per-task timeout overriding `[config].task_timeout`.
    #[serde(default)]
    pub timeout: Option<String>,
}

/// Validated task file. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerConfig,
    pub task: BTreeMap<String, TaskSpec>,
}

/// Validated single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub cmd: String,
    pub after: Vec<String>,
    pub timeout: Option<Duration>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerConfig,
        task: BTreeMap<String, TaskSpec>,
    ) -> Self {
        Self { scheduler, task }
    }

    /// Dependency graph of the configured tasks.
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(self.task.iter().map(|(name, spec)| {
            (name.as_str(), spec.after.iter().map(String::as_str))
        }))
    }

    /// Build one shell-command [`Task`] per configured task.
    pub fn to_tasks(&self) -> Vec<Task> {
        self.task
            .iter()
            .map(|(name, spec)| {
                let task = Task::new(name.clone(), shell_body(name.clone(), spec.cmd.clone()))
                    .after(spec.after.iter().cloned());
                match spec.timeout {
                    Some(timeout) => task.with_timeout(timeout),
                    None => task,
                }
            })
            .collect()
    }
}
