// src/exec/worker.rs

//! A single worker and the body runner it uses.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info};

use crate::dag::{FailureReason, TaskBody, TaskId, TaskRegistry, TaskStatus};
use crate::engine::LoopEvent;

pub(crate) struct Worker {
    idx: usize,
    registry: Arc<TaskRegistry>,
    work_rx: Arc<Mutex<mpsc::Receiver<TaskId>>>,
    notifier: mpsc::UnboundedSender<LoopEvent>,
    default_timeout: Option<Duration>,
}

impl Worker {
    pub(crate) fn new(
        idx: usize,
        registry: Arc<TaskRegistry>,
        work_rx: Arc<Mutex<mpsc::Receiver<TaskId>>>,
        notifier: mpsc::UnboundedSender<LoopEvent>,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            idx,
            registry,
            work_rx,
            notifier,
            default_timeout,
        }
    }

    pub(crate) async fn run(self) {
        debug!(worker = self.idx, "worker started");

        loop {
            // The lock only guards the receive; it is released before the
            // body runs so other workers can pick up work.
            let next = {
                let mut rx = self.work_rx.lock().await;
                rx.recv().await
            };

            match next {
                Some(task) => self.execute(task).await,
                None => break,
            }
        }

        debug!(worker = self.idx, "worker exiting (work channel closed)");
    }

    async fn execute(&self, task: TaskId) {
        let (status, reason) = match self.registry.take_body(&task) {
            Some(handle) => {
                let timeout = handle.timeout.or(self.default_timeout);
                info!(worker = self.idx, task = %task, ?timeout, "running task");

                match run_body(handle.body, timeout).await {
                    Ok(()) => (TaskStatus::Completed, None),
                    Err(reason) => (TaskStatus::Failed, Some(reason)),
                }
            }
            None => {
                error!(worker = self.idx, task = %task, "dispatched task has no body to run");
                (
                    TaskStatus::Failed,
                    Some(FailureReason::Body("task body unavailable".to_string())),
                )
            }
        };

        if let Err(err) = self.registry.transition(&task, status, reason) {
            error!(
                worker = self.idx,
                task = %task,
                error = %err,
                "failed to record task outcome"
            );
        }

        // The loop only uses this as a wake-up; it re-reads the registry.
        let _ = self.notifier.send(LoopEvent::TaskFinished { task, status });
    }
}

/// Run `body` to completion in its own tokio task.
///
/// Panics are captured as [`FailureReason::Panicked`]. When `timeout`
/// elapses the body's task is aborted and [`FailureReason::TimedOut`] is
/// returned.
pub async fn run_body(body: TaskBody, timeout: Option<Duration>) -> Result<(), FailureReason> {
    let mut handle = tokio::spawn(async move { body.invoke().await });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_elapsed) => {
                handle.abort();
                return Err(FailureReason::TimedOut(limit));
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(msg)) => Err(FailureReason::Body(msg)),
        Err(err) if err.is_panic() => Err(FailureReason::Panicked(panic_message(
            err.into_panic(),
        ))),
        Err(err) => Err(FailureReason::Body(format!("task body was cancelled: {err}"))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
