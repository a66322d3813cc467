// tests/shell_tasks.rs
#![cfg(unix)]

use std::error::Error;
use std::time::Duration;

use rundag::dag::{FailureReason, TaskStatus};
use rundag::engine::{Scheduler, SchedulerConfig};
use rundag::exec::{run_body, shell_body};
use rundag_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use rundag_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn successful_command_completes() {
    with_timeout(async {
        assert_eq!(run_body(shell_body("ok", "echo hello"), None).await, Ok(()));
    })
    .await;
}

#[tokio::test]
async fn non_zero_exit_is_a_body_failure() {
    with_timeout(async {
        match run_body(shell_body("bad", "exit 3"), None).await {
            Err(FailureReason::Body(msg)) => assert!(msg.contains("status 3"), "{msg}"),
            other => panic!("expected body failure, got {other:?}"),
        }
    })
    .await;
}

#[tokio::test]
async fn slow_command_is_killed_on_timeout() {
    with_timeout(async {
        let limit = Duration::from_millis(100);
        assert_eq!(
            run_body(shell_body("slow", "sleep 10"), Some(limit)).await,
            Err(FailureReason::TimedOut(limit))
        );
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn task_file_runs_end_to_end() -> TestResult {
    with_timeout(async {
        init_tracing();

        let cfg = ConfigFileBuilder::new()
            .with_workers(2)
            .with_task("fetch", TaskConfigBuilder::new("true").build())
            .with_task("build", TaskConfigBuilder::new("true").after("fetch").build())
            .with_task("lint", TaskConfigBuilder::new("false").build())
            .with_task("ship", TaskConfigBuilder::new("true").after("build").after("lint").build())
            .build();

        let scheduler_config: SchedulerConfig = cfg.scheduler;
        let report = Scheduler::new(
            rundag::dag::TaskRegistry::from_tasks(cfg.to_tasks())?,
            scheduler_config,
        )
        .run()
        .await?;

        assert_eq!(report.status_of("fetch"), Some(TaskStatus::Completed));
        assert_eq!(report.status_of("build"), Some(TaskStatus::Completed));
        assert_eq!(report.status_of("lint"), Some(TaskStatus::Failed));
        assert_eq!(report.status_of("ship"), Some(TaskStatus::Blocked));
        assert!(!report.all_completed());
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}
