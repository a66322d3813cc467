// tests/dependency_graph.rs

use std::error::Error;

use rundag::dag::{DependencyGraph, TaskRegistry};
use rundag_test_utils::tasks::ok_task;

type TestResult = Result<(), Box<dyn Error>>;

fn graph(entries: &[(&'static str, &[&'static str])]) -> DependencyGraph {
    DependencyGraph::build(entries.iter().map(|(name, deps)| (*name, deps.iter().copied())))
}

fn position(order: &[String], id: &str) -> usize {
    order.iter().position(|t| t == id).unwrap()
}

#[test]
fn topological_order_puts_dependencies_first() {
    let g = graph(&[
        ("test", &["build"]),
        ("build", &["fetch", "codegen"]),
        ("codegen", &["fetch"]),
        ("fetch", &[]),
        ("lint", &[]),
    ]);

    let order = g.topological_order().unwrap();
    assert_eq!(order.len(), 5);
    assert!(position(&order, "fetch") < position(&order, "codegen"));
    assert!(position(&order, "codegen") < position(&order, "build"));
    assert!(position(&order, "build") < position(&order, "test"));
}

#[test]
fn neighbours_are_sorted() {
    let g = graph(&[
        ("a", &[]),
        ("b", &["a"]),
        ("c", &["a"]),
        ("d", &["c", "b"]),
    ]);

    assert_eq!(g.dependents_of("a"), vec!["b", "c"]);
    assert_eq!(g.dependencies_of("d"), vec!["b", "c"]);
    assert!(g.dependencies_of("a").is_empty());
    assert!(g.dependents_of("unknown").is_empty());
    assert_eq!(g.tasks().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
}

#[test]
fn missing_dependencies_get_no_node() {
    let g = graph(&[("a", &["ghost"]), ("b", &["a", "phantom"])]);

    assert_eq!(
        g.missing_dependencies(),
        &[
            ("a".to_string(), "ghost".to_string()),
            ("b".to_string(), "phantom".to_string()),
        ]
    );
    assert_eq!(g.tasks().count(), 2);
    assert!(g.topological_order().is_ok());
}

#[test]
fn every_cycle_is_reported() {
    let g = graph(&[
        ("a", &["b"]),
        ("b", &["a"]),
        ("x", &["z"]),
        ("y", &["x"]),
        ("z", &["y"]),
        ("free", &[]),
    ]);

    let expected = vec![
        vec!["a".to_string(), "b".to_string()],
        vec!["x".to_string(), "y".to_string(), "z".to_string()],
    ];
    assert_eq!(g.cycles(), expected);
    assert_eq!(g.topological_order(), Err(expected));
}

#[test]
fn cycles_within_filters_by_membership() {
    let g = graph(&[("a", &["b"]), ("b", &["a"]), ("x", &["y"]), ("y", &["x"])]);

    let among = vec!["x".to_string(), "y".to_string()];
    assert_eq!(
        g.cycles_within(&among),
        vec![vec!["x".to_string(), "y".to_string()]]
    );
}

#[test]
fn graph_from_registry_snapshot_matches_tasks() -> TestResult {
    let registry = TaskRegistry::from_tasks(vec![
        ok_task("A", &[]),
        ok_task("B", &["A"]),
        ok_task("C", &["B", "missing"]),
    ])?;

    let g = DependencyGraph::from_snapshot(&registry.snapshot());
    assert_eq!(g.topological_order().unwrap(), vec!["A", "B", "C"]);
    assert_eq!(
        g.missing_dependencies(),
        &[("C".to_string(), "missing".to_string())]
    );
    Ok(())
}
