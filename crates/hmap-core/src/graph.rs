//! Task dependency graph checks: cycles, ordering, schedule conflicts and
//! references to tasks that no longer exist.
//!
//! Edges run from a dependency to the task that waits on it, so a
//! topological order lists prerequisites first.

use crate::task::Task;
use chrono::NaiveDate;
use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle among tasks: {}", format_cycles(.cycles))]
pub struct CycleError {
    pub cycles: Vec<Vec<String>>,
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|c| c.join(" -> "))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleConflict {
    pub task_id: String,
    pub dependency_id: String,
    pub task_start: NaiveDate,
    pub dependency_end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    pub task_id: String,
    pub missing: String,
}

/// Node weights are indices into the task slice.
fn build_graph(tasks: &[Task]) -> DiGraph<usize, ()> {
    let mut graph = DiGraph::with_capacity(tasks.len(), tasks.len());
    let nodes: Vec<NodeIndex> = (0..tasks.len()).map(|i| graph.add_node(i)).collect();
    let index: HashMap<&str, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();

    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.depends_on {
            if let Some(&d) = index.get(dep.as_str()) {
                graph.update_edge(nodes[d], nodes[i], ());
            }
        }
    }
    graph
}

/// Every group of tasks that depend on each other in a loop, including a
/// task that depends on itself. Ids in each group follow list order.
pub fn find_cycles(tasks: &[Task]) -> Vec<Vec<String>> {
    let graph = build_graph(tasks);
    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut members: Vec<usize> = scc.iter().map(|n| graph[*n]).collect();
            members.sort_unstable();
            members.into_iter().map(|i| tasks[i].id.clone()).collect()
        })
        .collect();
    cycles.sort();
    cycles
}

/// Prerequisites-first order. Among tasks that are ready at the same time,
/// list order is kept.
pub fn topological_order(tasks: &[Task]) -> Result<Vec<String>, CycleError> {
    let graph = build_graph(tasks);
    if is_cyclic_directed(&graph) {
        let cycles = find_cycles(tasks);
        tracing::debug!(count = cycles.len(), "task graph has cycles");
        return Err(CycleError { cycles });
    }

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();
    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(tasks.len());
    while let Some(i) = ready.pop_first() {
        order.push(tasks[i].id.clone());
        for next in graph.neighbors_directed(NodeIndex::new(i), Direction::Outgoing) {
            let j = graph[next];
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                ready.insert(j);
            }
        }
    }
    Ok(order)
}

/// Tasks scheduled to start on or before a dependency's planned end.
pub fn schedule_conflicts(tasks: &[Task]) -> Vec<ScheduleConflict> {
    let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut conflicts = Vec::new();
    for task in tasks {
        let Some(start) = task.start_date else {
            continue;
        };
        for dep_id in &task.depends_on {
            let Some(dep_end) = by_id.get(dep_id.as_str()).and_then(|d| d.end_date) else {
                continue;
            };
            if start <= dep_end {
                conflicts.push(ScheduleConflict {
                    task_id: task.id.clone(),
                    dependency_id: dep_id.clone(),
                    task_start: start,
                    dependency_end: dep_end,
                });
            }
        }
    }
    conflicts
}

pub fn dangling_references(tasks: &[Task]) -> Vec<DanglingReference> {
    let ids: BTreeSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    tasks
        .iter()
        .flat_map(|t| {
            t.depends_on
                .iter()
                .filter(|d| !ids.contains(d.as_str()))
                .map(|d| DanglingReference {
                    task_id: t.id.clone(),
                    missing: d.clone(),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, deps: &[&str]) -> Task {
        let mut t = Task::new(id, id);
        t.depends_on = deps.iter().map(|d| d.to_string()).collect();
        t
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn order_puts_prerequisites_first_and_keeps_list_order() {
        let tasks = vec![
            task("T1", &["T3"]),
            task("T2", &[]),
            task("T3", &[]),
            task("T4", &["T1", "T2"]),
        ];
        assert_eq!(
            topological_order(&tasks).unwrap(),
            vec!["T2", "T3", "T1", "T4"]
        );
    }

    #[test]
    fn cycle_is_an_error_not_a_hang() {
        let tasks = vec![
            task("T1", &["T3"]),
            task("T2", &["T1"]),
            task("T3", &["T2"]),
            task("T4", &[]),
        ];
        let err = topological_order(&tasks).unwrap_err();
        assert_eq!(err.cycles, vec![vec!["T1", "T2", "T3"]]);
        assert!(err.to_string().contains("T1 -> T2 -> T3"));
    }

    #[test]
    fn self_loop_counts_as_cycle() {
        let tasks = vec![task("T1", &["T1"]), task("T2", &["T1"])];
        assert_eq!(find_cycles(&tasks), vec![vec!["T1"]]);
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let tasks = vec![task("T1", &[]), task("T2", &["T1"])];
        assert!(find_cycles(&tasks).is_empty());
    }

    #[test]
    fn conflicts_and_dangling() {
        let mut a = task("T1", &[]);
        a.end_date = Some(date(10));
        let mut b = task("T2", &["T1", "T9"]);
        b.start_date = Some(date(8));
        let mut c = task("T3", &["T1"]);
        c.start_date = Some(date(11));
        let tasks = vec![a, b, c];

        let conflicts = schedule_conflicts(&tasks);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].task_id, "T2");
        assert_eq!(conflicts[0].dependency_end, date(10));

        assert_eq!(
            dangling_references(&tasks),
            vec![DanglingReference {
                task_id: "T2".into(),
                missing: "T9".into()
            }]
        );
    }
}
