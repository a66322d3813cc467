// src/engine/mod.rs

//! Scheduling engine.
//!
//! This module ties together:
//! - the scan logic that blocks, claims and reports progress ([`scan`])
//! - the control loop that dispatches claimed tasks to the worker pool and
//!   reacts to completion notifications ([`scheduler`])
//! - transition observers ([`observer`]) and the final [`report`].

use std::time::Duration;

use crate::dag::{TaskId, TaskStatus};

/// Default number of workers, matching the classic two-worker runner.
pub const DEFAULT_WORKERS: usize = 2;

/// Default fallback tick between scans when no notification arrives.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tunables for a scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Number of concurrent workers (at least 1).
    pub workers: usize,
    /// Capacity of the bounded work channel. Defaults to `workers`.
    pub queue_capacity: Option<usize>,
    /// Fallback tick between scans. Scans are normally driven by completion
    /// notifications; this only bounds latency if one is missed.
    pub poll_interval: Duration,
    /// Default per-task timeout. Tasks may override it.
    pub task_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            task_timeout: None,
        }
    }
}

impl SchedulerConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    /// Worker count, clamped to at least one.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }

    /// Work channel capacity: explicit value, else one slot per worker.
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or_else(|| self.effective_workers())
            .max(1)
    }
}

/// Events flowing into the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    /// A worker wrote a terminal status for this task.
    TaskFinished { task: TaskId, status: TaskStatus },
    /// Stop dispatching; let in-flight tasks drain.
    StopRequested,
}

pub mod observer;
pub mod report;
pub mod scan;
pub mod scheduler;

pub use observer::{TracingObserver, TransitionEvent, TransitionObserver};
pub use report::{RunReport, TaskReport};
pub use scan::{ScanStep, scan};
pub use scheduler::{Scheduler, StopHandle};
