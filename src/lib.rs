// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::TaskRegistry;
use crate::engine::Scheduler;

/// Exit code when the run finished but some tasks failed or were blocked.
pub const EXIT_PARTIAL_FAILURE: i32 = 2;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - task file loading
/// - registry + scheduler + worker pool
/// - Ctrl-C handling (graceful stop)
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    let mut scheduler_config = cfg.scheduler;
    if let Some(workers) = args.workers {
        scheduler_config.workers = usize::from(workers);
    }

    let registry = TaskRegistry::from_tasks(cfg.to_tasks())?;
    let scheduler = Scheduler::new(registry, scheduler_config);

    // Ctrl-C → stop dispatching, let running tasks finish.
    {
        let stop = scheduler.stop_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            stop.request_stop();
        });
    }

    info!(config = %args.config, "running task file");
    let report = scheduler.run().await?;

    println!("{report}");

    if report.all_completed() {
        Ok(0)
    } else {
        Ok(EXIT_PARTIAL_FAILURE)
    }
}

/// Simple dry-run output: tasks, dependencies, an execution order and any
/// problems the scheduler would report at run time.
fn print_dry_run(cfg: &ConfigFile) {
    println!("rundag dry-run");
    println!("  config.workers = {}", cfg.scheduler.effective_workers());
    println!(
        "  config.queue_capacity = {}",
        cfg.scheduler.effective_queue_capacity()
    );
    println!("  config.poll_interval = {:?}", cfg.scheduler.poll_interval);
    if let Some(timeout) = cfg.scheduler.task_timeout {
        println!("  config.task_timeout = {timeout:?}");
    }
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if let Some(timeout) = task.timeout {
            println!("      timeout: {timeout:?}");
        }
    }
    println!();

    let graph = cfg.dependency_graph();

    for (task, dep) in graph.missing_dependencies() {
        println!("warning: task '{task}' depends on unknown task '{dep}'; it will be blocked");
    }

    match graph.topological_order() {
        Ok(order) => println!("order: {}", order.join(" -> ")),
        Err(cycles) => {
            for cycle in cycles {
                println!(
                    "warning: dependency cycle [{}]; the run will deadlock",
                    cycle.join(", ")
                );
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
