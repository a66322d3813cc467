#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rundag::dag::{Task, TaskBody, TaskRegistry};
use rundag::engine::TransitionObserver;

/// `(task, started, finished)` recorded by [`timed_task`].
pub type Timeline = Arc<Mutex<Vec<(String, Instant, Instant)>>>;

pub fn new_timeline() -> Timeline {
    Arc::new(Mutex::new(Vec::new()))
}

/// Start/finish instants of `task` in `timeline`.
pub fn span_of(timeline: &Timeline, task: &str) -> Option<(Instant, Instant)> {
    timeline
        .lock()
        .unwrap()
        .iter()
        .find(|(name, _, _)| name == task)
        .map(|(_, start, end)| (*start, *end))
}

/// Task whose body succeeds immediately.
pub fn ok_task(id: &str, deps: &[&str]) -> Task {
    Task::new(id, TaskBody::new(|| async { Ok(()) })).after(deps.iter().copied())
}

/// Task whose body returns `Err(msg)`.
pub fn failing_task(id: &str, deps: &[&str], msg: &str) -> Task {
    let msg = msg.to_string();
    Task::new(id, TaskBody::new(move || async move { Err(msg) })).after(deps.iter().copied())
}

/// Task whose body sleeps for `delay` and then succeeds.
pub fn sleeping_task(id: &str, deps: &[&str], delay: Duration) -> Task {
    Task::new(
        id,
        TaskBody::new(move || async move {
            tokio::time::sleep(delay).await;
            Ok(())
        }),
    )
    .after(deps.iter().copied())
}

/// Task that bumps `counter` every time its body is invoked.
pub fn counting_task(id: &str, deps: &[&str], counter: Arc<AtomicUsize>) -> Task {
    Task::new(
        id,
        TaskBody::new(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    )
    .after(deps.iter().copied())
}

/// Task that sleeps for `delay` and records when its body started and
/// finished.
pub fn timed_task(id: &str, deps: &[&str], delay: Duration, timeline: Timeline) -> Task {
    let name = id.to_string();
    Task::new(
        id,
        TaskBody::new(move || async move {
            let started = Instant::now();
            tokio::time::sleep(delay).await;
            timeline
                .lock()
                .unwrap()
                .push((name, started, Instant::now()));
            Ok(())
        }),
    )
    .after(deps.iter().copied())
}

/// Registry wired to `observer`, populated with `tasks`.
pub fn registry_with(
    observer: Arc<dyn TransitionObserver>,
    tasks: impl IntoIterator<Item = Task>,
) -> Arc<TaskRegistry> {
    let registry = TaskRegistry::with_observer(observer);
    for task in tasks {
        registry.insert(task).expect("test task set must be valid");
    }
    Arc::new(registry)
}
