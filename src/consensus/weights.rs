//! Metropolis-Hastings consensus weights.
//!
//! For every edge `{i, j}` both `W[i][j]` and `W[j][i]` are set to
//! `1 / (max(deg(i), deg(j)) + 1)`. Once all edges are in place each
//! diagonal entry takes the remaining mass of its row, so every row sums
//! to one. An isolated node keeps a self-weight of one.

use crate::core::{DenseMatrix, Error, NodeId, Result};
use crate::graph::GraphModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tolerance used by the builder's own self-check.
const SELF_CHECK_TOLERANCE: f64 = 1e-9;

/// N×N consensus weight matrix.
///
/// Holds the dense matrix and, per row, the non-zero `(column, weight)`
/// pairs in ascending column order so that mixing rounds only touch a
/// node and its neighbours.
///
/// Only the dense matrix is trusted on deserialization; the row support is
/// recomputed from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WeightRecord")]
pub struct WeightMatrix {
    dense: DenseMatrix,
    support: Vec<Vec<(NodeId, f64)>>,
}

#[derive(Deserialize)]
struct WeightRecord {
    dense: DenseMatrix,
}

impl TryFrom<WeightRecord> for WeightMatrix {
    type Error = Error;

    fn try_from(record: WeightRecord) -> Result<Self> {
        Self::from_matrix(record.dense)
    }
}

impl WeightMatrix {
    /// Wrap an arbitrary square matrix.
    ///
    /// No stochasticity check is made: mass preservation under gossip is the
    /// caller's responsibility for matrices not produced by
    /// [`ConsensusWeightBuilder`].
    pub fn from_matrix(dense: DenseMatrix) -> Result<Self> {
        if dense.rows() != dense.cols() {
            return Err(Error::DimensionMismatch {
                expected: dense.rows(),
                actual: dense.cols(),
            });
        }

        let support = dense
            .iter_rows()
            .map(|row| {
                row.iter()
                    .copied()
                    .enumerate()
                    .filter(|&(_, w)| w != 0.0)
                    .collect()
            })
            .collect();

        Ok(Self { dense, support })
    }

    /// Matrix order N.
    pub fn order(&self) -> usize {
        self.dense.rows()
    }

    /// Entry `W[i][j]`.
    pub fn get(&self, i: NodeId, j: NodeId) -> f64 {
        self.dense.get(i, j)
    }

    /// Full row `i`.
    pub fn row(&self, i: NodeId) -> &[f64] {
        self.dense.row(i)
    }

    /// Non-zero entries of row `i` as `(column, weight)`.
    pub fn row_support(&self, i: NodeId) -> &[(NodeId, f64)] {
        &self.support[i]
    }

    /// Underlying dense matrix.
    pub fn as_matrix(&self) -> &DenseMatrix {
        &self.dense
    }

    /// Whether `|W[i][j] - W[j][i]| <= tolerance` for all pairs.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let n = self.order();
        (0..n).all(|i| (i + 1..n).all(|j| (self.get(i, j) - self.get(j, i)).abs() <= tolerance))
    }

    /// Whether every row sums to one within `tolerance`.
    pub fn is_row_stochastic(&self, tolerance: f64) -> bool {
        self.dense
            .iter_rows()
            .all(|row| (row.iter().sum::<f64>() - 1.0).abs() <= tolerance)
    }

    /// Smallest diagonal entry (1.0 for an empty matrix).
    pub fn min_diagonal(&self) -> f64 {
        (0..self.order())
            .map(|i| self.get(i, i))
            .fold(1.0, f64::min)
    }
}

/// Derives the Metropolis-Hastings [`WeightMatrix`] from a graph.
#[derive(Clone, Debug, Default)]
pub struct ConsensusWeightBuilder;

impl ConsensusWeightBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self
    }

    /// Build the weight matrix in one pass over the edges.
    ///
    /// Edge entries are written independently and the diagonal is computed
    /// from completed rows, so the result does not depend on edge order.
    pub fn build(&self, graph: &GraphModel) -> WeightMatrix {
        let n = graph.node_count();
        let mut dense = DenseMatrix::zeros(n, n);

        for (a, b) in graph.edges() {
            let weight = 1.0 / (graph.degree(a).max(graph.degree(b)) + 1) as f64;
            dense.set(a, b, weight);
            dense.set(b, a, weight);
        }

        for i in 0..n {
            let off_diagonal: f64 = dense
                .row(i)
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, w)| w)
                .sum();
            dense.set(i, i, 1.0 - off_diagonal);
        }

        let support = (0..n)
            .map(|i| {
                let mut entries: Vec<(NodeId, f64)> = graph
                    .neighbors(i)
                    .iter()
                    .map(|&j| (j, dense.get(i, j)))
                    .collect();
                let diag = dense.get(i, i);
                if diag != 0.0 {
                    let pos = entries.partition_point(|&(j, _)| j < i);
                    entries.insert(pos, (i, diag));
                }
                entries
            })
            .collect();

        let matrix = WeightMatrix { dense, support };

        if !matrix.is_symmetric(SELF_CHECK_TOLERANCE)
            || !matrix.is_row_stochastic(SELF_CHECK_TOLERANCE)
            || matrix.min_diagonal() < -SELF_CHECK_TOLERANCE
        {
            warn!(
                nodes = n,
                min_diagonal = matrix.min_diagonal(),
                "Metropolis-Hastings weights failed self-check"
            );
        }

        debug!(
            nodes = n,
            edges = graph.edge_count(),
            min_diagonal = matrix.min_diagonal(),
            "Built consensus weight matrix"
        );

        matrix
    }
}
