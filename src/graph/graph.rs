// src/graph/graph.rs

use std::collections::HashMap;
use std::fmt::Display;

use petgraph::algo::toposort;
use petgraph::graphmap::{DiGraphMap, NodeTrait};

use crate::errors::{CoordinatorError, Result};
use crate::model::TaskId;

use super::task::BuildTask;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct GraphNode {
    /// Direct dependencies: tasks that must succeed before this one can run.
    deps: Vec<TaskId>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskId>,
}

/// Simple in-memory dependency graph over the member tasks of one build set.
///
/// This is intentionally lightweight; acyclicity is validated with
/// [`ensure_acyclic`] before any task is created, so here we just keep
/// adjacency information for scheduling and diagnostics.
#[derive(Debug, Clone)]
pub struct BuildGraph {
    nodes: HashMap<TaskId, GraphNode>,
}

impl BuildGraph {
    /// Build the adjacency from the tasks' declared in-set dependencies.
    ///
    /// Assumes that:
    /// - every referenced dependency is a member of the set
    /// - the edges are acyclic
    pub fn from_tasks(tasks: &[BuildTask]) -> Self {
        let mut nodes: HashMap<TaskId, GraphNode> = HashMap::new();

        for task in tasks {
            nodes.insert(
                task.id,
                GraphNode {
                    deps: task.dependencies.clone(),
                    dependents: Vec::new(),
                },
            );
        }

        for task in tasks {
            for dep in &task.dependencies {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(task.id);
                }
            }
        }

        Self { nodes }
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, id: TaskId) -> &[TaskId] {
        self.nodes.get(&id).map(|n| n.deps.as_slice()).unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, id: TaskId) -> &[TaskId] {
        self.nodes
            .get(&id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}

/// Validate that the given dependency edges form a DAG.
///
/// `edges` are `(node, depends_on)` pairs. A cycle (including a
/// self-dependency) is a validation error reported at construction time,
/// never a runtime hang.
pub fn ensure_acyclic<N>(nodes: &[N], edges: &[(N, N)]) -> Result<()>
where
    N: NodeTrait + Display,
{
    let mut graph = DiGraphMap::<N, ()>::new();
    for node in nodes {
        graph.add_node(*node);
    }
    for (node, depends_on) in edges {
        graph.add_edge(*node, *depends_on, ());
    }

    toposort(&graph, None)
        .map(|_| ())
        .map_err(|cycle| CoordinatorError::DependencyCycle(cycle.node_id().to_string()))
}
