//! Execution planning: effective dependencies and task order
//!
//! Dependencies form a directed graph (edge `dep -> task`). Sequential crews
//! run in listed order and may only depend on earlier tasks; hierarchical
//! crews run in dependency order, taking ready tasks in listed order.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use super::{Process, TaskSpec};
use crate::{Error, Result};

/// Resolved order and dependencies for one crew run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Task names in execution order
    pub order: Vec<String>,
    /// Effective dependencies per task, in declared order
    pub dependencies: HashMap<String, Vec<String>>,
}

impl ExecutionPlan {
    pub fn dependencies_of(&self, task: &str) -> &[String] {
        self.dependencies.get(task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Last task in execution order
    pub fn last(&self) -> Option<&str> {
        self.order.last().map(String::as_str)
    }
}

/// Build the execution plan for `tasks` (listed order).
///
/// # Errors
/// `Validation` for duplicate task names, dependencies outside the crew, or
/// (sequential) a dependency on a task listed later; `Cycle` when the
/// dependency graph has no valid order.
pub fn build_plan(crew: &str, process: Process, tasks: &[&TaskSpec]) -> Result<ExecutionPlan> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for task in tasks {
        if index.contains_key(task.name.as_str()) {
            return Err(Error::Validation(format!(
                "Crew '{}' lists task '{}' more than once",
                crew, task.name
            )));
        }
        index.insert(task.name.as_str(), graph.add_node(task.name.as_str()));
    }

    let mut dependencies = HashMap::new();
    for (position, task) in tasks.iter().enumerate() {
        let deps = effective_dependencies(process, tasks, position);

        for dep in &deps {
            let from = *index.get(dep.as_str()).ok_or_else(|| {
                Error::Validation(format!(
                    "Task '{}' depends on '{}', which is not part of crew '{}'",
                    task.name, dep, crew
                ))
            })?;
            graph.update_edge(from, index[task.name.as_str()], ());
        }

        dependencies.insert(task.name.clone(), deps);
    }

    if let Err(cycle) = toposort(&graph, None) {
        return Err(Error::Cycle {
            crew: crew.to_string(),
            task: graph[cycle.node_id()].to_string(),
        });
    }

    let order: Vec<String> = match process {
        Process::Sequential => {
            let mut seen = HashSet::new();
            for task in tasks {
                if let Some(dep) = dependencies[&task.name].iter().find(|d| !seen.contains(d.as_str())) {
                    return Err(Error::Validation(format!(
                        "Task '{}' in sequential crew '{}' depends on '{}', which runs later",
                        task.name, crew, dep
                    )));
                }
                seen.insert(task.name.as_str());
            }
            tasks.iter().map(|t| t.name.clone()).collect()
        }
        Process::Hierarchical => stable_topological_order(&graph),
    };

    Ok(ExecutionPlan {
        order,
        dependencies,
    })
}

/// Dependencies a task actually waits on
fn effective_dependencies(process: Process, tasks: &[&TaskSpec], position: usize) -> Vec<String> {
    let task = tasks[position];
    match (&task.depends_on, process) {
        (Some(deps), _) => {
            let mut unique = Vec::with_capacity(deps.len());
            for dep in deps {
                if !unique.contains(dep) {
                    unique.push(dep.clone());
                }
            }
            unique
        }
        (None, Process::Sequential) if position > 0 => vec![tasks[position - 1].name.clone()],
        (None, _) => Vec::new(),
    }
}

/// Kahn's algorithm, always taking the earliest-listed ready node.
///
/// Node indices follow listed order. The graph must be acyclic.
fn stable_topological_order(graph: &DiGraph<&str, ()>) -> Vec<String> {
    let mut remaining: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();
    let mut done = vec![false; graph.node_count()];
    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(next) = graph
        .node_indices()
        .find(|n| !done[n.index()] && remaining[n.index()] == 0)
    {
        done[next.index()] = true;
        order.push(graph[next].to_string());
        for succ in graph.neighbors_directed(next, Direction::Outgoing) {
            remaining[succ.index()] -= 1;
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_task(name: &str) -> TaskSpec {
        TaskSpec::new(name, format!("do {}", name), "agent")
    }

    fn task(name: &str, deps: &[&str]) -> TaskSpec {
        open_task(name).depends_on(deps.iter().copied())
    }

    fn plan(process: Process, tasks: &[TaskSpec]) -> Result<ExecutionPlan> {
        let refs: Vec<&TaskSpec> = tasks.iter().collect();
        build_plan("crew", process, &refs)
    }

    #[test]
    fn test_sequential_keeps_listed_order_and_implicit_previous() {
        let tasks = vec![open_task("a"), open_task("b"), task("c", &[])];
        let plan = plan(Process::Sequential, &tasks).unwrap();

        assert_eq!(plan.order, vec!["a", "b", "c"]);
        assert!(plan.dependencies_of("a").is_empty());
        assert_eq!(plan.dependencies_of("b"), ["a".to_string()]);
        assert!(plan.dependencies_of("c").is_empty());
    }

    #[test]
    fn test_sequential_rejects_forward_dependency() {
        let tasks = vec![task("a", &["b"]), task("b", &[])];
        let err = plan(Process::Sequential, &tasks).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_hierarchical_orders_by_dependencies() {
        let tasks = vec![
            task("publish", &["write", "review"]),
            task("review", &["write"]),
            task("write", &["research"]),
            open_task("research"),
        ];
        let plan = plan(Process::Hierarchical, &tasks).unwrap();
        assert_eq!(plan.order, vec!["research", "write", "review", "publish"]);
    }

    #[test]
    fn test_hierarchical_tie_break_is_listed_order() {
        let tasks = vec![
            open_task("x"),
            task("summary", &["y", "x"]),
            open_task("y"),
        ];
        let plan = plan(Process::Hierarchical, &tasks).unwrap();
        assert_eq!(plan.order, vec!["x", "y", "summary"]);
        assert_eq!(plan.last(), Some("summary"));
    }

    #[test]
    fn test_cycle_detected_in_both_modes() {
        let tasks = vec![task("a", &["b"]), task("b", &["a"])];

        for process in [Process::Hierarchical, Process::Sequential] {
            let err = plan(process, &tasks).unwrap_err();
            assert!(matches!(err, Error::Cycle { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_dependency_outside_crew() {
        let tasks = vec![task("a", &["ghost"])];
        let err = plan(Process::Hierarchical, &tasks).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_duplicate_task_in_crew() {
        let tasks = vec![open_task("a"), open_task("a")];
        assert!(matches!(
            plan(Process::Sequential, &tasks),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_repeated_dependency_collapses() {
        let tasks = vec![open_task("a"), task("b", &["a", "a"])];
        let plan = plan(Process::Hierarchical, &tasks).unwrap();
        assert_eq!(plan.dependencies_of("b"), ["a".to_string()]);
    }
}
