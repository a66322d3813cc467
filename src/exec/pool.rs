// src/exec/pool.rs

//! Fixed-size worker pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dag::{TaskId, TaskRegistry};
use crate::engine::LoopEvent;
use crate::exec::worker::Worker;

/// A fixed number of workers sharing one bounded work channel.
///
/// Each worker pulls a task id, runs the task's body exactly once, writes
/// the terminal status back to the registry and notifies the control loop.
/// Workers exit when the work channel is closed and drained.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one) on the current tokio runtime.
    pub fn spawn(
        size: usize,
        registry: Arc<TaskRegistry>,
        work_rx: mpsc::Receiver<TaskId>,
        notifier: mpsc::UnboundedSender<LoopEvent>,
        default_timeout: Option<Duration>,
    ) -> Self {
        let size = size.max(1);
        let work_rx = Arc::new(Mutex::new(work_rx));

        let handles = (0..size)
            .map(|idx| {
                let worker = Worker::new(
                    idx,
                    Arc::clone(&registry),
                    Arc::clone(&work_rx),
                    notifier.clone(),
                    default_timeout,
                );
                tokio::spawn(worker.run())
            })
            .collect();

        info!(workers = size, "worker pool started");

        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to exit.
    pub async fn join(self) {
        for (idx, handle) in self.handles.into_iter().enumerate() {
            if let Err(err) = handle.await {
                warn!(worker = idx, error = %err, "worker terminated abnormally");
            }
        }
        info!("worker pool finished");
    }
}
