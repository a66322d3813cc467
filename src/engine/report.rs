// src/engine/report.rs

//! Final per-task outcome of a run.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::dag::{FailureReason, RegistrySnapshot, TaskId, TaskStatus};

/// Final status of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub id: TaskId,
    pub status: TaskStatus,
    pub reason: Option<FailureReason>,
}

/// Every task's terminal status and, for failed or blocked tasks, the
/// reason. Partial success is always visible here.
#[derive(Debug, Clone)]
pub struct RunReport {
    tasks: BTreeMap<TaskId, TaskReport>,
    elapsed: Duration,
}

impl RunReport {
    pub fn from_snapshot(snapshot: RegistrySnapshot, elapsed: Duration) -> Self {
        let tasks = snapshot
            .into_tasks()
            .into_iter()
            .map(|(id, t)| {
                let report = TaskReport {
                    id: id.clone(),
                    status: t.status,
                    reason: t.reason,
                };
                (id, report)
            })
            .collect();

        Self { tasks, elapsed }
    }

    /// Per-task reports, sorted by id.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.values()
    }

    pub fn get(&self, id: &str) -> Option<&TaskReport> {
        self.tasks.get(id)
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.tasks.get(id).map(|t| t.status)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// `true` when every task completed.
    pub fn all_completed(&self) -> bool {
        self.tasks
            .values()
            .all(|t| t.status == TaskStatus::Completed)
    }

    pub fn completed(&self) -> Vec<&TaskReport> {
        self.with_status(TaskStatus::Completed)
    }

    pub fn failed(&self) -> Vec<&TaskReport> {
        self.with_status(TaskStatus::Failed)
    }

    pub fn blocked(&self) -> Vec<&TaskReport> {
        self.with_status(TaskStatus::Blocked)
    }

    fn with_status(&self, status: TaskStatus) -> Vec<&TaskReport> {
        self.tasks.values().filter(|t| t.status == status).collect()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.tasks.keys().map(String::len).max().unwrap_or(0);

        for task in self.tasks.values() {
            write!(f, "  {:<width$}  {:<9}", task.id, task.status.to_string())?;
            if let Some(reason) = &task.reason {
                write!(f, "  {reason}")?;
            }
            writeln!(f)?;
        }

        write!(
            f,
            "{} completed, {} failed, {} blocked in {:.2?}",
            self.completed().len(),
            self.failed().len(),
            self.blocked().len(),
            self.elapsed
        )
    }
}
