//! Contact network model.
//!
//! Nodes are stored struct-of-arrays: features, labels and names live in
//! parallel vectors indexed by [`NodeId`]. The adjacency relation is a
//! sorted neighbour list per node. A [`GraphModel`] is immutable once built.

use crate::core::{Error, NodeId, Result, DEFAULT_FEATURE_DIM};
use crate::graph::components::Components;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Undirected contact network with per-node features and labels.
///
/// Deserialization rebuilds the graph through [`GraphBuilder`], so a loaded
/// graph satisfies the same checks as one built in code.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "GraphRecord")]
pub struct GraphModel {
    /// Node identifiers (e.g. the individual's ID string)
    names: Vec<String>,
    /// Name to index lookup
    index: HashMap<String, NodeId>,
    /// Row-major features, `node_count * feature_dim`
    features: Vec<f64>,
    /// Number of features per node
    feature_dim: usize,
    /// Binary labels
    labels: Vec<u8>,
    /// Sorted neighbour lists
    adjacency: Vec<Vec<NodeId>>,
    /// Number of undirected edges
    edge_count: usize,
}

impl GraphModel {
    /// Build a graph from index-addressed inputs.
    ///
    /// Node `i` gets `features[i]`, `labels[i]` and the name `"i"`. Edges are
    /// unordered pairs; a pair given twice (in either orientation) is one edge.
    pub fn new(
        features: Vec<Vec<f64>>,
        labels: Vec<u8>,
        edges: &[(NodeId, NodeId)],
    ) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(Error::LabelCountMismatch {
                expected: features.len(),
                actual: labels.len(),
            });
        }

        let mut builder = GraphBuilder::new();
        if let Some(first) = features.first() {
            builder = builder.with_feature_dim(first.len());
        }
        for (i, (x, y)) in features.into_iter().zip(labels).enumerate() {
            builder.add_node(i.to_string(), x, y)?;
        }
        for &(a, b) in edges {
            builder.add_edge(a, b);
        }
        builder.build()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of features per node.
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// Feature vector of a node.
    pub fn features(&self, node: NodeId) -> &[f64] {
        let start = node * self.feature_dim;
        &self.features[start..start + self.feature_dim]
    }

    /// Label of a node (0 or 1).
    pub fn label(&self, node: NodeId) -> u8 {
        self.labels[node]
    }

    /// All labels, indexed by node.
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Name of a node.
    pub fn name(&self, node: NodeId) -> &str {
        &self.names[node]
    }

    /// Look up a node by name.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Degree of a node.
    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency[node].len()
    }

    /// Neighbours of a node, in ascending order.
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.adjacency[node]
    }

    /// Check whether the undirected edge `{a, b}` exists.
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        a < self.node_count() && self.adjacency[a].binary_search(&b).is_ok()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Iterate over edges as `(a, b)` with `a < b`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(a, nbrs)| {
            nbrs.iter()
                .copied()
                .filter(move |&b| a < b)
                .map(move |b| (a, b))
        })
    }

    /// Degree of every node.
    pub fn degree_sequence(&self) -> Vec<usize> {
        self.adjacency.iter().map(Vec::len).collect()
    }

    /// Largest degree in the graph (0 for an empty graph).
    pub fn max_degree(&self) -> usize {
        self.adjacency.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Nodes with no neighbours.
    pub fn isolated_nodes(&self) -> Vec<NodeId> {
        (0..self.node_count())
            .filter(|&i| self.adjacency[i].is_empty())
            .collect()
    }

    /// Connected components of the graph.
    pub fn components(&self) -> Components {
        Components::compute(self)
    }
}

/// Stored form of a [`GraphModel`]. The name index and edge count are derived.
#[derive(Deserialize)]
struct GraphRecord {
    names: Vec<String>,
    features: Vec<f64>,
    feature_dim: usize,
    labels: Vec<u8>,
    adjacency: Vec<Vec<NodeId>>,
}

impl TryFrom<GraphRecord> for GraphModel {
    type Error = Error;

    fn try_from(record: GraphRecord) -> Result<Self> {
        let node_count = record.names.len();
        let dim = record.feature_dim;

        if record.labels.len() != node_count {
            return Err(Error::LabelCountMismatch {
                expected: node_count,
                actual: record.labels.len(),
            });
        }
        if record.adjacency.len() != node_count {
            return Err(Error::DimensionMismatch {
                expected: node_count,
                actual: record.adjacency.len(),
            });
        }
        if record.features.len() != node_count.saturating_mul(dim) {
            return Err(Error::DimensionMismatch {
                expected: node_count.saturating_mul(dim),
                actual: record.features.len(),
            });
        }

        let mut builder = GraphBuilder::new().with_feature_dim(dim);
        for (i, (name, label)) in record.names.into_iter().zip(record.labels).enumerate() {
            let x = record.features[i * dim..(i + 1) * dim].to_vec();
            builder.add_node(name, x, label)?;
        }
        for (a, nbrs) in record.adjacency.iter().enumerate() {
            for &b in nbrs {
                builder.add_edge(a, b);
            }
        }
        builder.build()
    }
}

/// Incremental builder for [`GraphModel`].
///
/// Node-level problems (bad features, bad labels, duplicate names) are
/// reported as soon as the node is added. Index-addressed edges are checked
/// in [`GraphBuilder::build`], so nodes and edges may be added in any order.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    feature_dim: Option<usize>,
    names: Vec<String>,
    index: HashMap<String, NodeId>,
    features: Vec<f64>,
    labels: Vec<u8>,
    edges: Vec<(NodeId, NodeId)>,
}

impl GraphBuilder {
    /// Create an empty builder. The feature dimension is taken from the first node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the expected feature dimension.
    pub fn with_feature_dim(mut self, dim: usize) -> Self {
        self.feature_dim = Some(dim);
        self
    }

    /// Number of nodes added so far.
    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Add a node and return its index.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        features: Vec<f64>,
        label: u8,
    ) -> Result<NodeId> {
        let name = name.into();
        let node = self.labels.len();

        if self.index.contains_key(&name) {
            return Err(Error::DuplicateNode(name));
        }

        let expected = self.feature_dim.unwrap_or(features.len());
        if expected == 0 {
            return Err(Error::EmptyFeatures);
        }
        if features.len() != expected {
            return Err(Error::FeatureDimensionMismatch {
                node,
                expected,
                actual: features.len(),
            });
        }
        if let Some(index) = features.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteFeature { node, index });
        }
        if label > 1 {
            return Err(Error::InvalidLabel { node, label });
        }

        self.feature_dim = Some(expected);
        self.index.insert(name.clone(), node);
        self.names.push(name);
        self.features.extend(features);
        self.labels.push(label);
        Ok(node)
    }

    /// Add an undirected edge by node index. Validated in [`GraphBuilder::build`].
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> &mut Self {
        self.edges.push((a, b));
        self
    }

    /// Add an undirected edge between two named nodes.
    pub fn add_edge_by_name(&mut self, a: &str, b: &str) -> Result<()> {
        let ia = *self
            .index
            .get(a)
            .ok_or_else(|| Error::UnknownNode(a.to_string()))?;
        let ib = *self
            .index
            .get(b)
            .ok_or_else(|| Error::UnknownNode(b.to_string()))?;
        self.edges.push((ia, ib));
        Ok(())
    }

    /// Validate edges and freeze the graph.
    pub fn build(self) -> Result<GraphModel> {
        let node_count = self.labels.len();

        let mut unique = BTreeSet::new();
        for &(a, b) in &self.edges {
            for node in [a, b] {
                if node >= node_count {
                    return Err(Error::NodeOutOfRange { node, node_count });
                }
            }
            if a == b {
                return Err(Error::SelfLoop(a));
            }
            unique.insert((a.min(b), a.max(b)));
        }

        let mut adjacency = vec![Vec::new(); node_count];
        for &(a, b) in &unique {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        for nbrs in &mut adjacency {
            nbrs.sort_unstable();
        }

        Ok(GraphModel {
            names: self.names,
            index: self.index,
            features: self.features,
            feature_dim: self.feature_dim.unwrap_or(DEFAULT_FEATURE_DIM),
            labels: self.labels,
            adjacency,
            edge_count: unique.len(),
        })
    }
}
