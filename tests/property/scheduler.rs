use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use rundag::dag::{Task, TaskStatus};
use rundag::engine::{Scheduler, SchedulerConfig};
use rundag_test_utils::observer::RecordingObserver;
use rundag_test_utils::tasks::{failing_task, ok_task, registry_with};

/// One generated task: its dependencies and whether its body fails.
#[derive(Debug, Clone)]
struct GenTask {
    deps: Vec<String>,
    fails: bool,
}

// Acyclic by construction: task N may only depend on tasks 0..N-1. A small
// share of tasks also depend on a task that is never submitted.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = BTreeMap<String, GenTask>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let per_task = (
            proptest::collection::vec(any::<usize>(), 0..4),
            proptest::bool::weighted(0.2),
            proptest::bool::weighted(0.1),
        );

        proptest::collection::vec(per_task, num_tasks).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (potential_deps, fails, dangling))| {
                    let mut deps: BTreeSet<String> = BTreeSet::new();
                    if i > 0 {
                        for dep_idx in potential_deps {
                            deps.insert(format!("task_{:02}", dep_idx % i));
                        }
                    }
                    if dangling {
                        deps.insert("never_submitted".to_string());
                    }
                    (
                        format!("task_{i:02}"),
                        GenTask {
                            deps: deps.into_iter().collect(),
                            fails,
                        },
                    )
                })
                .collect()
        })
    })
}

fn build_task(name: &str, spec: &GenTask) -> Task {
    let deps: Vec<&str> = spec.deps.iter().map(String::as_str).collect();
    if spec.fails {
        failing_task(name, &deps, "generated failure")
    } else {
        ok_task(name, &deps)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_task_reaches_a_consistent_terminal_status(
        dag in dag_strategy(12),
        workers in 1usize..=4,
    ) {
        let observer = RecordingObserver::new();
        let registry = registry_with(
            observer.clone(),
            dag.iter().map(|(name, spec)| build_task(name, spec)),
        );

        let report = Scheduler::new(registry, SchedulerConfig::default().with_workers(workers))
            .run_blocking()
            .expect("acyclic task sets never deadlock");

        prop_assert_eq!(report.len(), dag.len());

        for (name, spec) in &dag {
            let status = report.status_of(name).expect("task in report");
            prop_assert!(status.is_terminal(), "{} ended {}", name, status);

            let dep_status = |dep: &String| report.status_of(dep);

            match status {
                TaskStatus::Completed => {
                    prop_assert!(!spec.fails);
                    for dep in &spec.deps {
                        prop_assert_eq!(dep_status(dep), Some(TaskStatus::Completed));
                    }
                    prop_assert_eq!(observer.dispatch_count(name), 1);
                }
                TaskStatus::Failed => {
                    prop_assert!(spec.fails);
                    prop_assert_eq!(observer.dispatch_count(name), 1);
                }
                TaskStatus::Blocked => {
                    let has_bad_dep = spec.deps.iter().any(|dep| {
                        matches!(
                            dep_status(dep),
                            None | Some(TaskStatus::Failed) | Some(TaskStatus::Blocked)
                        )
                    });
                    prop_assert!(has_bad_dep, "{} blocked without a bad dependency", name);
                    prop_assert_eq!(observer.dispatch_count(name), 0);
                }
                other => prop_assert!(false, "{} left in {}", name, other),
            }
        }
    }
}
