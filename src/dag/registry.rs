// src/dag/registry.rs

//! Concurrency-safe task store for a single run.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::dag::task::{FailureReason, Task, TaskBody, TaskId, TaskSnapshot, TaskStatus};
use crate::engine::observer::{TracingObserver, TransitionEvent, TransitionObserver};
use crate::errors::{Result, RundagError};

/// Internal per-task record.
#[derive(Debug)]
struct TaskEntry {
    view: TaskSnapshot,
    /// Taken exactly once by the worker that runs the task.
    body: Option<TaskBody>,
    timeout: Option<Duration>,
}

#[derive(Debug, Default)]
struct Inner {
    tasks: BTreeMap<TaskId, TaskEntry>,
    /// Set when a run starts; no inserts are accepted afterwards.
    sealed: bool,
}

/// Body handed to a worker, plus the task's own timeout override.
#[derive(Debug)]
pub struct BodyHandle {
    pub body: TaskBody,
    pub timeout: Option<Duration>,
}

/// Owns every task of a run.
///
/// All mutation goes through one mutex, which is never held across an
/// `.await`. Status changes are linearizable and observers are notified
/// after the lock has been released.
pub struct TaskRegistry {
    inner: Mutex<Inner>,
    observer: Arc<dyn TransitionObserver>,
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    /// Empty registry that logs transitions through `tracing`.
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    pub fn with_observer(observer: Arc<dyn TransitionObserver>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            observer,
        }
    }

    /// Build a registry from a batch of tasks, failing on the first
    /// structural error.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Result<Self> {
        let registry = Self::new();
        for task in tasks {
            registry.insert(task)?;
        }
        Ok(registry)
    }

    /// Add a task in `Pending` state.
    pub fn insert(&self, task: Task) -> Result<()> {
        let mut inner = self.lock();

        if inner.sealed {
            return Err(RundagError::RegistrySealed(task.id));
        }
        if task.dependencies.contains(&task.id) {
            return Err(RundagError::SelfDependency(task.id));
        }
        if inner.tasks.contains_key(&task.id) {
            return Err(RundagError::DuplicateTask(task.id));
        }

        debug!(task = %task.id, deps = ?task.dependencies, "task registered");

        let Task {
            id,
            dependencies,
            body,
            timeout,
        } = task;

        inner.tasks.insert(
            id.clone(),
            TaskEntry {
                view: TaskSnapshot {
                    id,
                    dependencies,
                    status: TaskStatus::Pending,
                    reason: None,
                },
                body: Some(body),
                timeout,
            },
        );

        Ok(())
    }

    /// Current snapshot of a single task.
    pub fn get(&self, id: &str) -> Option<TaskSnapshot> {
        self.lock().tasks.get(id).map(|entry| entry.view.clone())
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.lock().tasks.get(id).map(|entry| entry.view.status)
    }

    /// Consistent copy of every task, taken under a single lock acquisition.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.lock();
        RegistrySnapshot {
            tasks: inner
                .tasks
                .iter()
                .map(|(id, entry)| (id.clone(), entry.view.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    /// Atomically move `id` to `to`, recording `reason`.
    ///
    /// Rejects unknown tasks and any move that is not a legal forward step;
    /// a rejected call leaves the task untouched.
    pub fn transition(
        &self,
        id: &str,
        to: TaskStatus,
        reason: Option<FailureReason>,
    ) -> Result<TransitionEvent> {
        let event = {
            let mut inner = self.lock();
            let entry = inner
                .tasks
                .get_mut(id)
                .ok_or_else(|| RundagError::TaskNotFound(id.to_string()))?;

            let from = entry.view.status;
            if !from.can_transition_to(to) {
                return Err(RundagError::InvalidTransition {
                    task: id.to_string(),
                    from,
                    to,
                });
            }

            entry.view.status = to;
            if reason.is_some() {
                entry.view.reason = reason.clone();
            }
            if to == TaskStatus::Blocked {
                // Never dispatched, so the body is never run.
                entry.body = None;
            }

            TransitionEvent {
                task: entry.view.id.clone(),
                from,
                to,
                reason,
                at: Instant::now(),
            }
        };

        self.observer.on_transition(&event);
        Ok(event)
    }

    /// Claim `id` for dispatch (`Pending -> Running`).
    ///
    /// Exactly one caller can win the claim for a given task; only the
    /// winner may enqueue it.
    pub fn claim(&self, id: &str) -> Result<()> {
        self.transition(id, TaskStatus::Running, None).map(|_| ())
    }

    /// Hand the body of a `Running` task to the caller.
    ///
    /// Returns `None` if the task is unknown, not running, or its body was
    /// already taken.
    pub fn take_body(&self, id: &str) -> Option<BodyHandle> {
        let mut inner = self.lock();
        let entry = inner.tasks.get_mut(id)?;
        if entry.view.status != TaskStatus::Running {
            trace!(task = %id, status = %entry.view.status, "take_body on non-running task");
            return None;
        }
        let body = entry.body.take()?;
        Some(BodyHandle {
            body,
            timeout: entry.timeout,
        })
    }

    /// Refuse further inserts. Called by the scheduler when a run starts.
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every critical section leaves the map consistent, so a panic in
        // another thread cannot leave it half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Point-in-time copy of every task in a registry, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    tasks: BTreeMap<TaskId, TaskSnapshot>,
}

impl RegistrySnapshot {
    pub fn get(&self, id: &str) -> Option<&TaskSnapshot> {
        self.tasks.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskSnapshot> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks currently in `status`.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.values().filter(|t| t.status == status).count()
    }

    /// Ids of tasks currently in `status`, sorted.
    pub fn ids_with_status(&self, status: TaskStatus) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.status == status)
            .map(|t| t.id.clone())
            .collect()
    }

    pub fn all_terminal(&self) -> bool {
        self.tasks.values().all(|t| t.status.is_terminal())
    }

    pub(crate) fn into_tasks(self) -> BTreeMap<TaskId, TaskSnapshot> {
        self.tasks
    }
}
