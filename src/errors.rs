// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only structural problems (bad submissions, registry contract violations,
//! config errors) and the run-level deadlock surface here. Per-task failures
//! never become an `Err`; they are recorded on the task as a
//! [`FailureReason`](crate::dag::FailureReason).

use thiserror::Error;

use crate::dag::{TaskId, TaskStatus};

#[derive(Error, Debug)]
pub enum RundagError {
    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskId),

    #[error("Task '{0}' cannot depend on itself")]
    SelfDependency(TaskId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Illegal status transition for task '{task}': {from} -> {to}")]
    InvalidTransition {
        task: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Task registry is sealed; cannot insert '{0}' after the run started")]
    RegistrySealed(TaskId),

    #[error(
        "Deadlock: {} task(s) can never run: {}",
        .stuck.len(),
        .stuck.join(", ")
    )]
    Deadlock {
        /// Tasks left `pending` with no possible progress (sorted).
        stuck: Vec<TaskId>,
        /// Dependency cycles among the stuck tasks, if any.
        cycles: Vec<Vec<TaskId>>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RundagError>;
