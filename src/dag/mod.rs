// src/dag/mod.rs

//! Task model, registry and dependency logic.
//!
//! - [`task`] defines tasks, bodies, statuses and failure reasons.
//! - [`registry`] is the concurrency-safe store that owns every task of a run
//!   and is the single place where statuses change.
//! - [`evaluator`] decides, from a registry snapshot, whether a pending task
//!   can run, must wait, or is permanently blocked.
//! - [`graph`] holds a `petgraph` view of the task set for ordering and cycle
//!   reporting.

pub mod evaluator;
pub mod graph;
pub mod registry;
pub mod task;

pub use evaluator::{Readiness, evaluate, is_runnable};
pub use graph::DependencyGraph;
pub use registry::{BodyHandle, RegistrySnapshot, TaskRegistry};
pub use task::{
    BodyFuture, DependencyProblem, FailureReason, Task, TaskBody, TaskId, TaskSnapshot,
    TaskStatus, UnsatisfiableDependency,
};
