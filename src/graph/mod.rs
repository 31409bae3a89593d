//! The step dependency graph.
//!
//! A thin facade over a petgraph directed graph. Node ids are dense
//! integers handed out in insertion order; an edge `from -> to` means
//! "from depends on to". The topological order is computed with Kahn's
//! algorithm using a FIFO queue, so the result is stable for a given
//! insertion order.

use std::collections::VecDeque;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;

/// Errors from graph traversal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The graph contains at least one dependency cycle.
    #[error("dependency cycle detected")]
    Cycle,
}

/// A node id, unique and dense within one graph.
pub type NodeId = usize;

/// Directed acyclic graph of build steps.
#[derive(Debug)]
pub struct Dag {
    graph: DiGraph<(), ()>,
}

impl Default for Dag {
    fn default() -> Self {
        Self::new()
    }
}

impl Dag {
    /// Create an empty graph.
    pub fn new() -> Self {
        Dag {
            graph: DiGraph::new(),
        }
    }

    /// Add a node and return its id. Ids start at 0 and are dense.
    pub fn add_node(&mut self) -> NodeId {
        self.graph.add_node(()).index()
    }

    /// Record that `from` depends on `to`. Duplicate edges are ignored;
    /// the edge set is a set, not a multiset.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let (from, to) = (NodeIndex::new(from), NodeIndex::new(to));
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependencies of a node.
    pub fn dependency_count(&self, node: NodeId) -> usize {
        self.graph
            .neighbors_directed(NodeIndex::new(node), Direction::Outgoing)
            .count()
    }

    /// Number of dependents of a node.
    pub fn dependent_count(&self, node: NodeId) -> usize {
        self.graph
            .neighbors_directed(NodeIndex::new(node), Direction::Incoming)
            .count()
    }

    /// Whether an edge `from -> to` exists.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.graph
            .contains_edge(NodeIndex::new(from), NodeIndex::new(to))
    }

    /// Compute a topological order: dependencies before dependents.
    ///
    /// Kahn's algorithm; the queue is seeded with every node that has no
    /// dependencies, in insertion order, and drained FIFO. If the emitted
    /// count does not reach the node count the graph has a cycle and no
    /// order is produced.
    pub fn topo_sort(&self) -> Result<Vec<NodeId>, GraphError> {
        let count = self.graph.node_count();
        let mut remaining: Vec<usize> = vec![0; count];
        for node in self.graph.node_indices() {
            remaining[node.index()] = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .count();
        }

        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|n| remaining[n.index()] == 0)
            .collect();

        let mut order = Vec::with_capacity(count);
        while let Some(node) = queue.pop_front() {
            order.push(node.index());

            for dependent in self.graph.neighbors_directed(node, Direction::Incoming) {
                remaining[dependent.index()] -= 1;
                if remaining[dependent.index()] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() != count {
            return Err(GraphError::Cycle);
        }
        Ok(order)
    }

    /// Nodes with no dependents, in insertion order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|n| {
                self.graph
                    .neighbors_directed(*n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|n| n.index())
            .collect()
    }

    /// Nodes with no dependencies, in insertion order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|n| {
                self.graph
                    .neighbors_directed(*n, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|n| n.index())
            .collect()
    }
}
