// tests/worker_pool.rs

use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;

use rundag::dag::{TaskRegistry, TaskStatus};
use rundag::engine::LoopEvent;
use rundag::exec::WorkerPool;
use rundag_test_utils::tasks::{failing_task, ok_task};
use rundag_test_utils::with_timeout;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pool_runs_claimed_tasks_and_notifies_the_loop() -> TestResult {
    with_timeout(async {
        let registry = Arc::new(TaskRegistry::from_tasks(vec![
            ok_task("A", &[]),
            ok_task("B", &[]),
            failing_task("C", &[], "nope"),
        ])?);

        let (work_tx, work_rx) = mpsc::channel(3);
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let pool = WorkerPool::spawn(3, Arc::clone(&registry), work_rx, events_tx, None);
        assert_eq!(pool.size(), 3);

        for id in ["A", "B", "C"] {
            registry.claim(id)?;
            work_tx.send(id.to_string()).await?;
        }
        drop(work_tx);
        pool.join().await;

        let mut finished = Vec::new();
        while let Some(event) = events_rx.recv().await {
            if let LoopEvent::TaskFinished { task, status } = event {
                finished.push((task, status));
            }
        }
        finished.sort();

        assert_eq!(
            finished,
            vec![
                ("A".to_string(), TaskStatus::Completed),
                ("B".to_string(), TaskStatus::Completed),
                ("C".to_string(), TaskStatus::Failed),
            ]
        );
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn pool_always_has_at_least_one_worker() {
    let (_work_tx, work_rx) = mpsc::channel(1);
    let (events_tx, _events_rx) = mpsc::unbounded_channel();
    let pool = WorkerPool::spawn(0, Arc::new(TaskRegistry::new()), work_rx, events_tx, None);
    assert_eq!(pool.size(), 1);
}
