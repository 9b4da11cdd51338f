//! Build DAG for task dependency management.
//!
//! This module provides a directed acyclic graph of [`TaskNode`]s with edges
//! from each dependency to its dependents, and computes parallel execution
//! waves from it.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};

use super::types::{GraphError, TaskAction, TaskId, TaskKind, TaskNode};

/// A DAG of build tasks.
///
/// Node insertion order is preserved and used wherever a deterministic order
/// is needed (waves, listings).
#[derive(Debug, Clone)]
pub struct BuildGraph {
  /// The underlying graph. Edges point from dependency to dependent.
  graph: DiGraph<TaskNode, ()>,

  /// Map from task id to node index.
  nodes: HashMap<TaskId, NodeIndex>,
}

impl BuildGraph {
  /// Build a graph from a set of nodes.
  ///
  /// # Errors
  ///
  /// Returns `DuplicateNode` if two nodes share an id, `UnknownDependency` if
  /// a node names a dependency that is not present, and `CycleDetected` if
  /// the dependencies do not form a DAG.
  pub fn from_nodes(task_nodes: Vec<TaskNode>) -> Result<Self, GraphError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    // First pass: create nodes
    for node in task_nodes {
      let id = node.id.clone();
      if nodes.contains_key(&id) {
        return Err(GraphError::DuplicateNode(id));
      }
      let idx = graph.add_node(node);
      nodes.insert(id, idx);
    }

    // Second pass: add edges from dependency to dependent
    let mut edges = Vec::new();
    for idx in graph.node_indices() {
      let node = &graph[idx];
      for dep in &node.depends_on {
        let Some(&dep_idx) = nodes.get(dep) else {
          return Err(GraphError::UnknownDependency {
            task: node.id.clone(),
            dependency: dep.clone(),
          });
        };
        edges.push((dep_idx, idx));
      }
    }
    for (from, to) in edges {
      graph.add_edge(from, to, ());
    }

    let dag = Self { graph, nodes };

    dag.verify_acyclic()?;

    Ok(dag)
  }

  /// Verify that the graph is acyclic.
  fn verify_acyclic(&self) -> Result<(), GraphError> {
    toposort(&self.graph, None).map_err(|_| GraphError::CycleDetected)?;
    Ok(())
  }

  /// Get a node by id.
  pub fn node(&self, id: &TaskId) -> Option<&TaskNode> {
    self.nodes.get(id).map(|&idx| &self.graph[idx])
  }

  /// Check whether a node exists.
  pub fn contains(&self, id: &TaskId) -> bool {
    self.nodes.contains_key(id)
  }

  /// All nodes in insertion order.
  pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
    self.graph.node_indices().map(|idx| &self.graph[idx])
  }

  /// All nodes of a kind, in insertion order.
  pub fn nodes_of_kind(&self, kind: TaskKind) -> impl Iterator<Item = &TaskNode> {
    self.nodes().filter(move |node| node.kind == kind)
  }

  /// Number of nodes in the graph.
  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  /// Returns true if the graph has no nodes.
  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  /// Get the direct dependencies of a node.
  pub fn dependencies(&self, id: &TaskId) -> Vec<TaskId> {
    self.neighbors(id, Direction::Incoming)
  }

  /// Get the direct dependents of a node.
  pub fn dependents(&self, id: &TaskId) -> Vec<TaskId> {
    self.neighbors(id, Direction::Outgoing)
  }

  fn neighbors(&self, id: &TaskId, direction: Direction) -> Vec<TaskId> {
    let Some(&idx) = self.nodes.get(id) else {
      return Vec::new();
    };

    let mut ids: Vec<TaskId> = self
      .graph
      .neighbors_directed(idx, direction)
      .map(|n| self.graph[n].id.clone())
      .collect();
    ids.sort();
    ids
  }

  /// Every node that transitively depends on `id`, excluding `id` itself.
  ///
  /// This is the set of nodes a failure of `id` cancels.
  pub fn transitive_dependents(&self, id: &TaskId) -> BTreeSet<TaskId> {
    self.reachable(id, false)
  }

  /// Every node `id` transitively depends on, excluding `id` itself.
  pub fn transitive_dependencies(&self, id: &TaskId) -> BTreeSet<TaskId> {
    self.reachable(id, true)
  }

  fn reachable(&self, id: &TaskId, upstream: bool) -> BTreeSet<TaskId> {
    let Some(&start) = self.nodes.get(id) else {
      return BTreeSet::new();
    };

    let mut found = BTreeSet::new();
    if upstream {
      let reversed = Reversed(&self.graph);
      let mut bfs = Bfs::new(reversed, start);
      while let Some(idx) = bfs.next(reversed) {
        found.insert(self.graph[idx].id.clone());
      }
    } else {
      let mut bfs = Bfs::new(&self.graph, start);
      while let Some(idx) = bfs.next(&self.graph) {
        found.insert(self.graph[idx].id.clone());
      }
    }
    found.remove(id);
    found
  }

  /// Get task ids in topological order.
  ///
  /// Dependencies come before dependents.
  pub fn topological_order(&self) -> Result<Vec<TaskId>, GraphError> {
    let sorted = toposort(&self.graph, None).map_err(|_| GraphError::CycleDetected)?;
    Ok(sorted.into_iter().map(|idx| self.graph[idx].id.clone()).collect())
  }

  /// Get nodes organized into parallel execution waves.
  ///
  /// Each wave contains nodes whose dependencies are all in previous waves.
  /// Within a wave, nodes keep insertion order.
  ///
  /// # Example
  ///
  /// For a single spec `orders`:
  /// - Wave 0: [generate-Orders]
  /// - Wave 1: [compileOrdersJava, generateAllOpenApi]
  /// - Wave 2: [jar-Orders, compileJava]
  /// - Wave 3: [build]
  pub fn execution_waves(&self) -> Result<Vec<Vec<TaskId>>, GraphError> {
    // Use Kahn's algorithm variant to compute levels
    let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
    let mut node_level: HashMap<NodeIndex, usize> = HashMap::new();

    for idx in self.graph.node_indices() {
      in_degree.insert(idx, self.graph.neighbors_directed(idx, Direction::Incoming).count());
    }

    let mut current_level = 0;
    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();

    while !remaining.is_empty() {
      // Find nodes with no remaining dependencies
      let ready: Vec<NodeIndex> = remaining.iter().filter(|&&idx| in_degree[&idx] == 0).copied().collect();

      if ready.is_empty() {
        return Err(GraphError::CycleDetected);
      }

      for &idx in &ready {
        node_level.insert(idx, current_level);
        remaining.remove(&idx);
      }

      // Decrement in-degree of dependents
      for &idx in &ready {
        for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&neighbor) {
            *deg = deg.saturating_sub(1);
          }
        }
      }

      current_level += 1;
    }

    let mut waves: Vec<Vec<TaskId>> = vec![Vec::new(); current_level];
    for idx in self.graph.node_indices() {
      if let Some(&level) = node_level.get(&idx) {
        waves[level].push(self.graph[idx].id.clone());
      }
    }

    waves.retain(|w| !w.is_empty());

    Ok(waves)
  }

  /// Package nodes with their spec and declared output file.
  ///
  /// This is the fixed spec → artifact mapping the publisher uses.
  pub fn package_outputs(&self) -> Vec<(&TaskNode, &Path)> {
    self
      .nodes_of_kind(TaskKind::Package)
      .filter_map(|node| match &node.action {
        TaskAction::Package(action) => Some((node, action.output_file.as_path())),
        _ => None,
      })
      .collect()
  }
}
