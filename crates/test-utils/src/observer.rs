use std::sync::{Arc, Mutex};
use std::time::Instant;

use rundag::dag::TaskStatus;
use rundag::engine::{TransitionEvent, TransitionObserver};

/// Observer that keeps every transition in memory for assertions.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TransitionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// `(from, to)` pairs recorded for `task`, in commit order.
    pub fn transitions_of(&self, task: &str) -> Vec<(TaskStatus, TaskStatus)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.task == task)
            .map(|e| (e.from, e.to))
            .collect()
    }

    /// Number of times `task` was claimed for dispatch.
    pub fn dispatch_count(&self, task: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.task == task && e.to == TaskStatus::Running)
            .count()
    }

    /// Total number of dispatch events across all tasks.
    pub fn total_dispatches(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.to == TaskStatus::Running)
            .count()
    }

    /// When `task` entered `status`, if it did.
    pub fn time_of(&self, task: &str, status: TaskStatus) -> Option<Instant> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.task == task && e.to == status)
            .map(|e| e.at)
    }
}

impl TransitionObserver for RecordingObserver {
    fn on_transition(&self, event: &TransitionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
