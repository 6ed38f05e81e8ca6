//! Static dependency graph of a task catalog
//!
//! Used for introspection (help, the interface document, the `tasks` listing).
//! Execution does not consult it; the registry walks dependees directly and
//! catches cycles as it goes.

use std::collections::HashMap;

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use petgraph::Direction;
use thiserror::Error;

use super::def::TaskCatalog;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("adding dependency would create a cycle: {0} -> {1}")]
    CycleDetected(String, String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("task can't depend on itself: {0}")]
    SelfDependency(String),
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Edges point from a dependency to the task that needs it
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: &TaskCatalog) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for def in catalog.iter() {
            graph.add_task(def.name());
        }
        for def in catalog.iter() {
            for dependee in def.dependees() {
                graph.add_dependency(def.name(), dependee)?;
            }
        }
        Ok(graph)
    }

    pub fn add_task(&mut self, name: &str) {
        if !self.node_map.contains_key(name) {
            let idx = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), idx);
        }
    }

    /// `task` depends on `depends_on`
    pub fn add_dependency(&mut self, task: &str, depends_on: &str) -> Result<(), GraphError> {
        if task == depends_on {
            return Err(GraphError::SelfDependency(task.to_string()));
        }
        let task_idx = self.index(task)?;
        let dep_idx = self.index(depends_on)?;

        let edge = self.graph.add_edge(dep_idx, task_idx, ());
        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(GraphError::CycleDetected(
                task.to_string(),
                depends_on.to_string(),
            ));
        }
        Ok(())
    }

    fn index(&self, name: &str) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::TaskNotFound(name.to_string()))
    }

    /// Direct dependencies, sorted by name
    pub fn dependencies(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Tasks that directly depend on `name`, sorted by name
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.node_map.get(name) else {
            return vec![];
        };
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        names.sort();
        names
    }

    /// Everything `name` needs, directly or not, in dependency order
    pub fn transitive_dependencies(&self, name: &str) -> Result<Vec<String>, GraphError> {
        let start = self.index(name)?;
        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, start);
        let mut reachable = Vec::new();
        while let Some(idx) = dfs.next(reversed) {
            if idx != start {
                reachable.push(idx);
            }
        }
        Ok(self
            .topological_order()?
            .into_iter()
            .filter(|n| reachable.iter().any(|&idx| self.graph[idx] == *n))
            .collect())
    }

    /// All tasks, dependencies before dependents
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|idx| self.graph[idx].clone()).collect())
            .map_err(|cycle| {
                let name = self.graph[cycle.node_id()].clone();
                GraphError::CycleDetected(name.clone(), name)
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}
