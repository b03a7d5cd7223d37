//! Connected components of a contact network.
//!
//! Gossip averaging never moves information between components, so the
//! component is the scope over which each node's averaged gradient is taken.

use crate::core::NodeId;
use crate::graph::model::GraphModel;
use serde::Serialize;
use std::collections::VecDeque;

/// Partition of the node set into connected components.
///
/// Components are numbered in order of their smallest node index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Components {
    /// Component index of each node
    component_of: Vec<usize>,
    /// Members of each component, ascending
    members: Vec<Vec<NodeId>>,
}

impl Components {
    /// Label components with a breadth-first search from each unvisited node.
    pub fn compute(graph: &GraphModel) -> Self {
        let n = graph.node_count();
        let mut component_of = vec![usize::MAX; n];
        let mut members = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..n {
            if component_of[start] != usize::MAX {
                continue;
            }
            let id = members.len();
            let mut group = Vec::new();
            component_of[start] = id;
            queue.push_back(start);

            while let Some(node) = queue.pop_front() {
                group.push(node);
                for &next in graph.neighbors(node) {
                    if component_of[next] == usize::MAX {
                        component_of[next] = id;
                        queue.push_back(next);
                    }
                }
            }

            group.sort_unstable();
            members.push(group);
        }

        Self {
            component_of,
            members,
        }
    }

    /// Number of components.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Number of nodes covered by the partition.
    pub fn node_count(&self) -> usize {
        self.component_of.len()
    }

    /// Component index of a node.
    pub fn component_of(&self, node: NodeId) -> usize {
        self.component_of[node]
    }

    /// Nodes in a component.
    pub fn members(&self, component: usize) -> &[NodeId] {
        &self.members[component]
    }

    /// Iterate over all components.
    pub fn iter(&self) -> impl Iterator<Item = &[NodeId]> {
        self.members.iter().map(Vec::as_slice)
    }

    /// Size of each component.
    pub fn sizes(&self) -> Vec<usize> {
        self.members.iter().map(Vec::len).collect()
    }

    /// Size of the largest component.
    pub fn largest(&self) -> usize {
        self.members.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Whether two nodes share a component.
    pub fn same_component(&self, a: NodeId, b: NodeId) -> bool {
        self.component_of[a] == self.component_of[b]
    }

    /// Whether the whole graph is a single component.
    pub fn is_connected(&self) -> bool {
        self.members.len() <= 1
    }
}
