//! Dependency ordering for build runs.
//!
//! A [`DependencyGraph`] is induced by a fixed item set: one node per item,
//! one edge from dependency to dependent for every reference whose target is
//! in the set. References leaving the set are not ordering constraints and
//! are ignored here. Ordering uses Kahn's algorithm with a deterministic
//! tie-break (among simultaneously ready items the earliest in input order
//! wins), so repeated sorts of an unchanged set produce identical output.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::tree::Workspace;
use crate::types::ItemId;

use super::types::ExecuteError;

/// Dependency graph over a fixed set of items for one configuration.
pub struct DependencyGraph {
  graph: DiGraph<ItemId, ()>,
  nodes: HashMap<ItemId, NodeIndex>,
  /// Input order; the tie-break for [`topological_order`].
  ///
  /// [`topological_order`]: DependencyGraph::topological_order
  order: Vec<ItemId>,
}

impl DependencyGraph {
  /// Build the graph induced by `items` under `configuration`. Duplicate
  /// ids in the input collapse to one node.
  pub fn new(workspace: &Workspace, items: &[ItemId], configuration: &str) -> Self {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();
    let mut order = Vec::with_capacity(items.len());

    for &item in items {
      if nodes.contains_key(&item) {
        continue;
      }
      nodes.insert(item, graph.add_node(item));
      order.push(item);
    }

    for &item in &order {
      let dependent = nodes[&item];
      for dependency in workspace.referenced_ids(item, configuration) {
        // targets outside the set are not ordering constraints
        if let Some(&dependency_index) = nodes.get(&dependency) {
          graph.add_edge(dependency_index, dependent, ());
        }
      }
    }

    Self { graph, nodes, order }
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// Direct in-set dependencies of `item`.
  pub fn dependencies_of(&self, item: ItemId) -> Vec<ItemId> {
    let Some(&index) = self.nodes.get(&item) else {
      return Vec::new();
    };
    self
      .graph
      .neighbors_directed(index, Direction::Incoming)
      .map(|dependency| self.graph[dependency])
      .collect()
  }

  /// Order the set so every dependency precedes its dependents.
  ///
  /// Fails with [`ExecuteError::CyclicDependency`] when items remain but
  /// none is ready; no partial order escapes. Ties between ready items
  /// break toward the earliest input position, so the output is stable
  /// across calls on an unchanged set.
  pub fn topological_order(&self) -> Result<Vec<ItemId>, ExecuteError> {
    let mut position = HashMap::new();
    for (pos, item) in self.order.iter().enumerate() {
      position.insert(self.nodes[item], pos);
    }

    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|index| (index, self.graph.neighbors_directed(index, Direction::Incoming).count()))
      .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
      .iter()
      .filter(|&(_, &degree)| degree == 0)
      .map(|(index, _)| Reverse(position[index]))
      .collect();

    let mut sorted = Vec::with_capacity(self.order.len());
    while let Some(Reverse(pos)) = ready.pop() {
      let item = self.order[pos];
      sorted.push(item);

      let index = self.nodes[&item];
      for dependent in self.graph.neighbors_directed(index, Direction::Outgoing) {
        if let Some(degree) = in_degree.get_mut(&dependent) {
          *degree -= 1;
          if *degree == 0 {
            ready.push(Reverse(position[&dependent]));
          }
        }
      }
    }

    if sorted.len() < self.order.len() {
      return Err(ExecuteError::CyclicDependency);
    }
    Ok(sorted)
  }
}

/// Order `items` so every dependency precedes its dependents.
pub fn topological_sort(
  workspace: &Workspace,
  items: &[ItemId],
  configuration: &str,
) -> Result<Vec<ItemId>, ExecuteError> {
  DependencyGraph::new(workspace, items, configuration).topological_order()
}
