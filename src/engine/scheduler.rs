// src/engine/scheduler.rs

//! The control loop that drives a registry to completion.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info, trace, warn};

use crate::dag::{DependencyGraph, TaskId, TaskRegistry};
use crate::errors::{Result, RundagError};
use crate::exec::WorkerPool;

use super::report::RunReport;
use super::scan::scan;
use super::{LoopEvent, SchedulerConfig};

/// Drives a closed task set to completion.
///
/// The control loop scans the registry, blocks tasks that can never run,
/// claims runnable ones and pushes their ids into a bounded work channel
/// consumed by the [`WorkerPool`]. Workers notify the loop after every
/// terminal transition, which triggers the next scan. The loop ends once
/// every task is terminal, or with [`RundagError::Deadlock`] when pending
/// tasks remain and nothing can make progress.
pub struct Scheduler {
    registry: Arc<TaskRegistry>,
    config: SchedulerConfig,
    events_tx: mpsc::UnboundedSender<LoopEvent>,
    events_rx: mpsc::UnboundedReceiver<LoopEvent>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Requests a graceful stop of a running [`Scheduler`].
///
/// After a stop no new task is dispatched, remaining pending tasks end
/// `Blocked` with [`FailureReason::Stopped`](crate::dag::FailureReason::Stopped),
/// and in-flight bodies run to completion.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: mpsc::UnboundedSender<LoopEvent>,
}

impl StopHandle {
    pub fn request_stop(&self) {
        if self.tx.send(LoopEvent::StopRequested).is_err() {
            debug!("stop requested after the run already finished");
        }
    }
}

impl Scheduler {
    pub fn new(registry: impl Into<Arc<TaskRegistry>>, config: SchedulerConfig) -> Self {
        if config.workers == 0 {
            warn!("worker count 0 is not allowed; using 1 worker");
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            registry: registry.into(),
            config,
            events_tx,
            events_rx,
        }
    }

    /// Shared handle to the registry, usable after the run to query final
    /// statuses.
    pub fn registry(&self) -> Arc<TaskRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.events_tx.clone(),
        }
    }

    /// Build a multi-threaded tokio runtime and block on [`Scheduler::run`].
    ///
    /// Must not be called from within an async context.
    pub fn run_blocking(self) -> Result<RunReport> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.effective_workers() + 1)
            .enable_all()
            .build()?;
        runtime.block_on(self.run())
    }

    /// Main control loop.
    ///
    /// Returns once every task is terminal and every worker has exited.
    pub async fn run(self) -> Result<RunReport> {
        let Scheduler {
            registry,
            config,
            events_tx,
            mut events_rx,
        } = self;

        registry.seal();
        let started = Instant::now();

        let workers = config.effective_workers();
        let capacity = config.effective_queue_capacity();
        info!(
            tasks = registry.len(),
            workers,
            queue_capacity = capacity,
            "scheduler run started"
        );

        let (work_tx, work_rx) = mpsc::channel::<TaskId>(capacity);
        let pool = WorkerPool::spawn(
            workers,
            Arc::clone(&registry),
            work_rx,
            events_tx,
            config.task_timeout,
        );

        let mut stopping = false;
        let mut scans: u64 = 0;

        let outcome = loop {
            scans += 1;
            let step = scan(&registry, stopping);

            trace!(
                scan = scans,
                claimed = ?step.newly_claimed,
                blocked = ?step.newly_blocked,
                pending = step.pending.len(),
                running = step.running,
                "scan finished"
            );

            if step.all_terminal() {
                break Ok(());
            }
            if step.is_stalled() {
                break Err(deadlock(&registry, step.pending));
            }

            // Blocks while the channel is full.
            let mut dispatch_failed = None;
            for task in step.newly_claimed {
                if let Err(err) = work_tx.send(task).await {
                    dispatch_failed = Some(err.0);
                    break;
                }
            }
            if let Some(task) = dispatch_failed {
                break Err(RundagError::Other(anyhow!(
                    "worker pool shut down before task '{task}' could be dispatched"
                )));
            }

            let mut stop_seen = matches!(
                next_event(&mut events_rx, config.poll_interval).await,
                Some(LoopEvent::StopRequested)
            );
            while let Ok(event) = events_rx.try_recv() {
                stop_seen |= event == LoopEvent::StopRequested;
            }
            if stop_seen && !stopping {
                info!("stop requested; no further tasks will be dispatched");
                stopping = true;
            }
        };

        // Closing the channel lets idle workers exit; busy ones finish first.
        drop(work_tx);
        pool.join().await;

        outcome?;

        let report = RunReport::from_snapshot(registry.snapshot(), started.elapsed());
        info!(
            completed = report.completed().len(),
            failed = report.failed().len(),
            blocked = report.blocked().len(),
            scans,
            elapsed = ?report.elapsed(),
            "scheduler run finished"
        );

        Ok(report)
    }
}

/// Wait for the next notification, or the fallback tick.
async fn next_event(
    events_rx: &mut mpsc::UnboundedReceiver<LoopEvent>,
    poll_interval: Duration,
) -> Option<LoopEvent> {
    match time::timeout(poll_interval, events_rx.recv()).await {
        Ok(Some(event)) => {
            trace!(?event, "scheduler received event");
            Some(event)
        }
        Ok(None) => {
            // Every sender is gone; fall back to plain polling.
            time::sleep(poll_interval).await;
            None
        }
        Err(_elapsed) => None,
    }
}

fn deadlock(registry: &TaskRegistry, stuck: Vec<TaskId>) -> RundagError {
    let graph = DependencyGraph::from_snapshot(&registry.snapshot());
    let cycles = graph.cycles_within(&stuck);

    error!(
        ?stuck,
        ?cycles,
        "no pending task can make progress; aborting run"
    );

    RundagError::Deadlock { stuck, cycles }
}
