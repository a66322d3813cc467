// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::dag::registry::RegistrySnapshot;
use crate::dag::task::TaskId;

/// Static dependency structure of a task set, backed by `petgraph`.
///
/// Edge direction: dependency -> dependent. For a task `B` that runs after
/// `A` there is an edge `A -> B`. Dependencies naming unknown tasks get no
/// edge; they are kept in `missing` for diagnostics.
///
/// The scheduler itself never needs this graph to make progress. It is used
/// for dry-run ordering and for naming the cycles behind a deadlock.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<TaskId, ()>,
    index: BTreeMap<TaskId, NodeIndex>,
    missing: Vec<(TaskId, TaskId)>,
}

impl DependencyGraph {
    /// Build a graph from `(task, dependencies)` pairs.
    pub fn build<'a, I, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, D)>,
        D: IntoIterator<Item = &'a str>,
    {
        let entries: Vec<(&str, Vec<&str>)> = entries
            .into_iter()
            .map(|(name, deps)| (name, deps.into_iter().collect()))
            .collect();

        let mut graph = DiGraph::new();
        let mut index = BTreeMap::new();

        // First pass: one node per task.
        for (name, _) in &entries {
            index
                .entry(name.to_string())
                .or_insert_with(|| graph.add_node(name.to_string()));
        }

        // Second pass: edges for known deps, record the rest.
        let mut missing = Vec::new();
        for (name, deps) in &entries {
            let to = index[*name];
            for dep in deps {
                match index.get(*dep) {
                    Some(&from) => {
                        graph.update_edge(from, to, ());
                    }
                    None => missing.push((name.to_string(), dep.to_string())),
                }
            }
        }
        missing.sort();

        Self {
            graph,
            index,
            missing,
        }
    }

    pub fn from_snapshot(snapshot: &RegistrySnapshot) -> Self {
        Self::build(snapshot.iter().map(|t| {
            (
                t.id.as_str(),
                t.dependencies.iter().map(String::as_str),
            )
        }))
    }

    /// Return all task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Known direct dependencies of `name`, sorted.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Direct dependents of `name` (tasks listing it as a dependency), sorted.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// `(task, dependency)` pairs where the dependency was never submitted.
    pub fn missing_dependencies(&self) -> &[(TaskId, TaskId)] {
        &self.missing
    }

    /// A valid execution order, or the cycles that prevent one.
    pub fn topological_order(&self) -> Result<Vec<TaskId>, Vec<Vec<TaskId>>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(_) => Err(self.cycles()),
        }
    }

    /// Every dependency cycle, each sorted by id; the list itself is sorted.
    pub fn cycles(&self) -> Vec<Vec<TaskId>> {
        let mut cycles: Vec<Vec<TaskId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&idx| self.graph.contains_edge(idx, idx))
            })
            .map(|component| {
                let mut names: Vec<TaskId> = component
                    .into_iter()
                    .map(|idx| self.graph[idx].clone())
                    .collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Cycles whose members all belong to `among`.
    pub fn cycles_within(&self, among: &[TaskId]) -> Vec<Vec<TaskId>> {
        let among: BTreeSet<&str> = among.iter().map(String::as_str).collect();
        self.cycles()
            .into_iter()
            .filter(|cycle| cycle.iter().all(|id| among.contains(id.as_str())))
            .collect()
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        out
    }
}
