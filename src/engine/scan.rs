// src/engine/scan.rs

//! A single scheduling scan over the registry.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dag::{
    FailureReason, Readiness, TaskId, TaskRegistry, TaskStatus, evaluate, is_runnable,
};

/// Structured result of one scan.
///
/// Useful for tests that want to drive the scheduler one scan at a time
/// without a worker pool.
#[derive(Debug, Clone, Default)]
pub struct ScanStep {
    /// Tasks this scan claimed (`Pending -> Running`). Only these may be
    /// sent to workers.
    pub newly_claimed: Vec<TaskId>,
    /// Tasks this scan moved to `Blocked`.
    pub newly_blocked: Vec<TaskId>,
    /// Tasks still `Pending` in the scanned snapshot, sorted.
    pub pending: Vec<TaskId>,
    /// Number of tasks `Running` in the scanned snapshot, including this
    /// scan's claims.
    pub running: usize,
}

impl ScanStep {
    /// Every task has reached a terminal status.
    pub fn all_terminal(&self) -> bool {
        self.pending.is_empty() && self.running == 0
    }

    /// Pending tasks remain, this scan changed nothing, and nothing is
    /// in flight that could still unblock them.
    pub fn is_stalled(&self) -> bool {
        self.newly_claimed.is_empty()
            && self.newly_blocked.is_empty()
            && !self.pending.is_empty()
            && self.running == 0
    }
}

/// Run one scan.
///
/// 1. Move every pending task whose dependencies can never be satisfied to
///    `Blocked`. Repeats against fresh snapshots until nothing new is
///    blocked, so a chain of dependents settles in a single scan. When
///    `stopping` is set, every pending task is blocked with
///    [`FailureReason::Stopped`] instead.
/// 2. Claim every task that is runnable against the final snapshot.
///
/// `pending` and `running` describe that same snapshot with this scan's
/// claims applied. Completions racing with the scan only ever make it look
/// busier, never stalled.
pub fn scan(registry: &TaskRegistry, stopping: bool) -> ScanStep {
    let mut newly_blocked = Vec::new();

    let snapshot = loop {
        let snapshot = registry.snapshot();
        let mut blocked_this_pass = 0usize;

        for task in snapshot.iter() {
            let reason = if stopping && task.status == TaskStatus::Pending {
                Some(FailureReason::Stopped)
            } else if let Readiness::Blocked(dep) = evaluate(task, &snapshot) {
                Some(FailureReason::Unsatisfiable(dep))
            } else {
                None
            };

            let Some(reason) = reason else { continue };

            match registry.transition(&task.id, TaskStatus::Blocked, Some(reason)) {
                Ok(_) => {
                    newly_blocked.push(task.id.clone());
                    blocked_this_pass += 1;
                }
                Err(err) => {
                    debug!(task = %task.id, error = %err, "could not block task; state changed concurrently");
                }
            }
        }

        if blocked_this_pass == 0 {
            break snapshot;
        }
    };

    let mut newly_claimed = Vec::new();
    for task in snapshot.iter().filter(|t| is_runnable(t, &snapshot)) {
        match registry.claim(&task.id) {
            Ok(()) => newly_claimed.push(task.id.clone()),
            Err(err) => {
                debug!(task = %task.id, error = %err, "lost claim; task will not be dispatched by this scan");
            }
        }
    }

    // Counts must come from the snapshot the claims were judged against. A
    // later snapshot can show a dependency completed after it was judged
    // `Waiting`, which would look like a stall.
    let claimed: BTreeSet<&TaskId> = newly_claimed.iter().collect();
    let pending = snapshot
        .ids_with_status(TaskStatus::Pending)
        .into_iter()
        .filter(|id| !claimed.contains(id))
        .collect();
    let running = snapshot.count(TaskStatus::Running) + newly_claimed.len();

    ScanStep {
        newly_claimed,
        newly_blocked,
        pending,
        running,
    }
}
