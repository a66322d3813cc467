// src/engine/observer.rs

//! Status-transition reporting.
//!
//! The registry emits one [`TransitionEvent`] per successful status change.
//! Observers run outside the registry lock and must not call back into the
//! registry's mutating API.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::dag::{FailureReason, TaskId, TaskStatus};

/// A single committed status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    pub task: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
    pub reason: Option<FailureReason>,
    pub at: Instant,
}

/// Receives every status transition committed by a registry.
pub trait TransitionObserver: Send + Sync {
    fn on_transition(&self, event: &TransitionEvent);
}

/// Default observer: one structured `tracing` event per transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TransitionObserver for TracingObserver {
    fn on_transition(&self, event: &TransitionEvent) {
        match (event.to, &event.reason) {
            (TaskStatus::Running, _) => {
                debug!(task = %event.task, from = %event.from, "task dispatched");
            }
            (TaskStatus::Completed, _) => {
                info!(task = %event.task, "task completed");
            }
            (TaskStatus::Failed, reason) => {
                warn!(
                    task = %event.task,
                    reason = %display_reason(reason.as_ref()),
                    "task failed"
                );
            }
            (TaskStatus::Blocked, reason) => {
                warn!(
                    task = %event.task,
                    reason = %display_reason(reason.as_ref()),
                    "task blocked; it will not run"
                );
            }
            // No legal transition targets `Pending`.
            (TaskStatus::Pending, _) => {}
        }
    }
}

fn display_reason(reason: Option<&FailureReason>) -> String {
    reason.map_or_else(|| "unknown".to_string(), ToString::to_string)
}
