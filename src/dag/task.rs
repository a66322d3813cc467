// src/dag/task.rs

//! Task description, run status and failure reasons.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Canonical task identifier type used throughout the crate.
pub type TaskId = String;

/// Future produced by invoking a [`TaskBody`].
pub type BodyFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'static>>;

/// The unit of work attached to a task.
///
/// A body is invoked at most once: invoking it consumes it. It resolves to
/// `Ok(())` on success or `Err(reason)` on failure. Panics are caught by the
/// worker that runs it.
pub struct TaskBody(Box<dyn FnOnce() -> BodyFuture + Send + 'static>);

impl TaskBody {
    /// Wrap an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        Self(Box::new(move || Box::pin(f())))
    }

    /// Wrap a synchronous closure.
    ///
    /// The closure runs on tokio's blocking pool so it may block freely. A
    /// panic inside it is re-raised in the worker's task so it is reported as
    /// [`FailureReason::Panicked`].
    pub fn blocking<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), String> + Send + 'static,
    {
        Self::new(move || async move {
            match tokio::task::spawn_blocking(f).await {
                Ok(result) => result,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => Err(format!("blocking body was cancelled: {err}")),
            }
        })
    }

    pub(crate) fn invoke(self) -> BodyFuture {
        (self.0)()
    }
}

impl fmt::Debug for TaskBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TaskBody(..)")
    }
}

/// Run status of a task.
///
/// Legal moves: `Pending -> Running -> {Completed, Failed}` and
/// `Pending -> Blocked`. Everything else is rejected by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskStatus {
    /// Submitted, not yet dispatched.
    Pending,
    /// Claimed by the scheduler and handed to a worker.
    Running,
    /// Body returned success.
    Completed,
    /// Body returned an error, panicked or timed out.
    Failed,
    /// Never dispatched: a dependency is missing, failed or blocked, or the
    /// run was stopped first.
    Blocked,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Blocked
        )
    }

    /// Whether `self -> next` is a legal forward move.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Blocked)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// Why a dependency can never be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyProblem {
    /// The dependency id was never submitted.
    Missing,
    /// The dependency ran and failed.
    Failed,
    /// The dependency was itself blocked.
    Blocked,
}

/// A dependency that permanently prevents a task from running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsatisfiableDependency {
    pub dependency: TaskId,
    pub problem: DependencyProblem,
}

impl fmt::Display for UnsatisfiableDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.problem {
            DependencyProblem::Missing => {
                write!(f, "dependency '{}' was never submitted", self.dependency)
            }
            DependencyProblem::Failed => write!(f, "dependency '{}' failed", self.dependency),
            DependencyProblem::Blocked => {
                write!(f, "dependency '{}' is blocked", self.dependency)
            }
        }
    }
}

/// Recorded reason for a `Failed` or `Blocked` task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The body returned an error.
    Body(String),
    /// The body panicked.
    Panicked(String),
    /// The body exceeded its timeout.
    TimedOut(Duration),
    /// A dependency can never complete.
    Unsatisfiable(UnsatisfiableDependency),
    /// The run was stopped before this task was dispatched.
    Stopped,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Body(msg) => write!(f, "{msg}"),
            FailureReason::Panicked(msg) => write!(f, "panicked: {msg}"),
            FailureReason::TimedOut(limit) => write!(f, "timed out after {limit:?}"),
            FailureReason::Unsatisfiable(dep) => write!(f, "unsatisfiable: {dep}"),
            FailureReason::Stopped => f.write_str("run stopped before dispatch"),
        }
    }
}

/// A unit of work submitted to the scheduler.
#[derive(Debug)]
pub struct Task {
    pub(crate) id: TaskId,
    pub(crate) dependencies: BTreeSet<TaskId>,
    pub(crate) body: TaskBody,
    pub(crate) timeout: Option<Duration>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, body: TaskBody) -> Self {
        Self {
            id: id.into(),
            dependencies: BTreeSet::new(),
            body,
            timeout: None,
        }
    }

    /// Add prerequisites that must complete before this task may run.
    pub fn after<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Per-task timeout, overriding the scheduler-wide default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dependencies(&self) -> &BTreeSet<TaskId> {
        &self.dependencies
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Read-only view of a task's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub dependencies: BTreeSet<TaskId>,
    pub status: TaskStatus,
    pub reason: Option<FailureReason>,
}
