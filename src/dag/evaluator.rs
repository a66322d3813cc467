// src/dag/evaluator.rs

//! Dependency satisfaction logic.
//!
//! Everything here is pure: it reads a [`RegistrySnapshot`] and never
//! mutates anything. Callers must re-evaluate against a fresh snapshot every
//! scan since dependencies complete asynchronously.

use crate::dag::registry::RegistrySnapshot;
use crate::dag::task::{DependencyProblem, TaskSnapshot, TaskStatus, UnsatisfiableDependency};

/// Outcome of evaluating a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The task is not `Pending`; nothing to decide.
    NotPending,
    /// Every dependency is `Completed`.
    Runnable,
    /// Some dependency is still `Pending` or `Running`.
    Waiting,
    /// Some dependency can never complete.
    Blocked(UnsatisfiableDependency),
}

/// Decide whether `task` can run given `snapshot`.
///
/// Blocking causes win over waiting ones: a task with one failed and one
/// still-running dependency is blocked right away.
pub fn evaluate(task: &TaskSnapshot, snapshot: &RegistrySnapshot) -> Readiness {
    if task.status != TaskStatus::Pending {
        return Readiness::NotPending;
    }

    let mut waiting = false;

    for dep_id in &task.dependencies {
        let problem = match snapshot.get(dep_id).map(|dep| dep.status) {
            None => Some(DependencyProblem::Missing),
            Some(TaskStatus::Failed) => Some(DependencyProblem::Failed),
            Some(TaskStatus::Blocked) => Some(DependencyProblem::Blocked),
            Some(TaskStatus::Pending) | Some(TaskStatus::Running) => {
                waiting = true;
                None
            }
            Some(TaskStatus::Completed) => None,
        };

        if let Some(problem) = problem {
            return Readiness::Blocked(UnsatisfiableDependency {
                dependency: dep_id.clone(),
                problem,
            });
        }
    }

    if waiting {
        Readiness::Waiting
    } else {
        Readiness::Runnable
    }
}

/// `true` iff `task` is `Pending` and all of its dependencies are `Completed`.
pub fn is_runnable(task: &TaskSnapshot, snapshot: &RegistrySnapshot) -> bool {
    matches!(evaluate(task, snapshot), Readiness::Runnable)
}
