//! Gossip averaging over a consensus weight matrix.
//!
//! Each round replaces every node's row with the weighted combination of
//! its own and its neighbours' rows from the previous round:
//! `estimate[t+1] = W · estimate[t]`. With a symmetric row-stochastic `W`
//! the column sums are preserved and every node converges to the mean of
//! its connected component.

use crate::consensus::weights::WeightMatrix;
use crate::core::{DenseMatrix, Error, Result};
use crate::graph::Components;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Result of a gossip run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GossipOutcome {
    /// Per-node estimate after the last round
    pub estimate: DenseMatrix,
    /// Number of rounds actually applied
    pub rounds: usize,
    /// Largest absolute entry change in the last round (0 if no rounds ran)
    pub last_change: f64,
}

/// Iterative weighted averaging of per-node vectors.
#[derive(Clone, Debug, Default)]
pub struct GossipAverager {
    /// Stop once a round changes no entry by more than this
    tolerance: Option<f64>,
    /// Compute rows with rayon
    parallel: bool,
}

impl GossipAverager {
    /// Create an averager that always runs the requested number of rounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop early once a round moves no entry by more than `tolerance`.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set or clear the early-exit tolerance.
    pub fn with_optional_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Compute each round's rows in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Apply `iterations` mixing rounds to `initial` and return the estimate.
    pub fn average(
        &self,
        initial: &DenseMatrix,
        weights: &WeightMatrix,
        iterations: usize,
    ) -> Result<DenseMatrix> {
        Ok(self.run(initial.clone(), weights, iterations)?.estimate)
    }

    /// Apply up to `iterations` mixing rounds, consuming the initial matrix.
    pub fn run(
        &self,
        initial: DenseMatrix,
        weights: &WeightMatrix,
        iterations: usize,
    ) -> Result<GossipOutcome> {
        if initial.rows() != weights.order() {
            return Err(Error::DimensionMismatch {
                expected: weights.order(),
                actual: initial.rows(),
            });
        }

        let mut current = initial;
        let mut last_change = 0.0;
        let mut rounds = 0;

        if current.cols() == 0 {
            return Ok(GossipOutcome {
                estimate: current,
                rounds,
                last_change,
            });
        }

        let mut next = DenseMatrix::zeros(current.rows(), current.cols());

        while rounds < iterations {
            self.mix_round(weights, &current, &mut next);
            last_change = next.max_abs_diff(&current);
            std::mem::swap(&mut current, &mut next);
            rounds += 1;

            trace!(round = rounds, change = last_change, "Gossip round");

            if let Some(tolerance) = self.tolerance {
                if last_change <= tolerance {
                    break;
                }
            }
        }

        Ok(GossipOutcome {
            estimate: current,
            rounds,
            last_change,
        })
    }

    /// One synchronous round: every output row reads only the frozen input.
    fn mix_round(&self, weights: &WeightMatrix, current: &DenseMatrix, next: &mut DenseMatrix) {
        let cols = current.cols();
        if self.parallel {
            next.as_mut_slice()
                .par_chunks_mut(cols)
                .enumerate()
                .for_each(|(i, out)| mix_row(weights, current, i, out));
        } else {
            next.as_mut_slice()
                .chunks_mut(cols)
                .enumerate()
                .for_each(|(i, out)| mix_row(weights, current, i, out));
        }
    }
}

fn mix_row(weights: &WeightMatrix, current: &DenseMatrix, i: usize, out: &mut [f64]) {
    out.fill(0.0);
    for &(j, w) in weights.row_support(i) {
        for (o, v) in out.iter_mut().zip(current.row(j)) {
            *o += w * v;
        }
    }
}

/// Exact per-component mean of `values`, written to every member's row.
///
/// This is the fixed point gossip converges to on each connected component.
pub fn component_average(values: &DenseMatrix, components: &Components) -> Result<DenseMatrix> {
    if values.rows() != components.node_count() {
        return Err(Error::DimensionMismatch {
            expected: components.node_count(),
            actual: values.rows(),
        });
    }

    let mut averaged = DenseMatrix::zeros(values.rows(), values.cols());
    for members in components.iter() {
        let mut mean = vec![0.0; values.cols()];
        for &node in members {
            for (m, v) in mean.iter_mut().zip(values.row(node)) {
                *m += v;
            }
        }
        let size = members.len() as f64;
        for m in &mut mean {
            *m /= size;
        }
        for &node in members {
            averaged.row_mut(node).copy_from_slice(&mean);
        }
    }

    Ok(averaged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::weights::ConsensusWeightBuilder;
    use crate::core::NodeId;
    use crate::graph::GraphModel;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn graph(n: usize, edges: &[(NodeId, NodeId)]) -> GraphModel {
        GraphModel::new(vec![vec![0.0; 6]; n], vec![0; n], edges).unwrap()
    }

    fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> DenseMatrix {
        let data = (0..rows)
            .map(|_| (0..cols).map(|_| rng.gen_range(-5.0..5.0)).collect())
            .collect();
        DenseMatrix::from_rows(data).unwrap()
    }

    #[test]
    fn test_zero_iterations_is_identity() {
        let g = graph(3, &[(0, 1), (1, 2)]);
        let w = ConsensusWeightBuilder::new().build(&g);
        let initial = DenseMatrix::column(&[1.0, 2.0, 3.0]);

        let outcome = GossipAverager::new().run(initial.clone(), &w, 0).unwrap();
        assert_eq!(outcome.estimate, initial);
        assert_eq!(outcome.rounds, 0);
    }

    #[test]
    fn test_single_round_matches_matrix_product() {
        let g = graph(3, &[(0, 1), (1, 2)]);
        let w = ConsensusWeightBuilder::new().build(&g);
        let initial = DenseMatrix::column(&[3.0, 0.0, 6.0]);

        let result = GossipAverager::new().average(&initial, &w, 1).unwrap();
        // W = [[2/3, 1/3, 0], [1/3, 1/3, 1/3], [0, 1/3, 2/3]]
        assert!((result.get(0, 0) - 2.0).abs() < 1e-12);
        assert!((result.get(1, 0) - 3.0).abs() < 1e-12);
        assert!((result.get(2, 0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_mass_preservation() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            let n = rng.gen_range(2..30);
            let mut edges = Vec::new();
            for a in 0..n {
                for b in a + 1..n {
                    if rng.gen_bool(0.2) {
                        edges.push((a, b));
                    }
                }
            }
            let g = graph(n, &edges);
            let w = ConsensusWeightBuilder::new().build(&g);
            let initial = random_matrix(&mut rng, n, 4);

            let result = GossipAverager::new().average(&initial, &w, 17).unwrap();
            for (before, after) in initial.column_sums().iter().zip(result.column_sums()) {
                assert!((before - after).abs() < 1e-9);
            }
            assert!((initial.sum() - result.sum()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_is_fixed_point() {
        let g = graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (0, 2)]);
        let w = ConsensusWeightBuilder::new().build(&g);
        let initial = DenseMatrix::from_rows(vec![vec![2.5, -1.0]; 5]).unwrap();

        let result = GossipAverager::new().average(&initial, &w, 100).unwrap();
        assert!(result.max_abs_diff(&initial) < 1e-12);
    }

    #[test]
    fn test_converges_to_component_mean() {
        let g = graph(7, &[(0, 1), (1, 2), (2, 3), (4, 5), (5, 6), (6, 4)]);
        let w = ConsensusWeightBuilder::new().build(&g);
        let initial =
            DenseMatrix::from_rows((0..7).map(|i| vec![i as f64, (i * i) as f64]).collect())
                .unwrap();

        let result = GossipAverager::new().average(&initial, &w, 500).unwrap();
        let exact = component_average(&initial, &g.components()).unwrap();

        assert!(result.max_abs_diff(&exact) < 1e-8);
        assert!((exact.get(0, 0) - 1.5).abs() < 1e-12);
        assert!((exact.get(5, 0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_isolated_node_unchanged() {
        let g = graph(4, &[(0, 1), (1, 2)]);
        let w = ConsensusWeightBuilder::new().build(&g);
        let initial = DenseMatrix::column(&[1.0, 5.0, 9.0, 42.0]);

        for iterations in [0, 1, 7, 250] {
            let result = GossipAverager::new().average(&initial, &w, iterations).unwrap();
            assert_eq!(result.get(3, 0), 42.0);
        }
    }

    #[test]
    fn test_early_exit() {
        let g = graph(3, &[(0, 1), (1, 2), (2, 0)]);
        let w = ConsensusWeightBuilder::new().build(&g);
        let initial = DenseMatrix::column(&[0.0, 3.0, 6.0]);

        // One triangle round reaches the mean, the next changes nothing.
        let outcome = GossipAverager::new()
            .with_tolerance(1e-12)
            .run(initial, &w, 50)
            .unwrap();

        assert_eq!(outcome.rounds, 2);
        assert!(outcome.last_change <= 1e-12);
        assert!((outcome.estimate.get(2, 0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(3);
        let n = 40;
        let edges: Vec<_> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        let g = graph(n, &edges);
        let w = ConsensusWeightBuilder::new().build(&g);
        let initial = random_matrix(&mut rng, n, 7);

        let sequential = GossipAverager::new().average(&initial, &w, 30).unwrap();
        let parallel = GossipAverager::new()
            .with_parallel(true)
            .average(&initial, &w, 30)
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_dimension_mismatch() {
        let g = graph(3, &[]);
        let w = ConsensusWeightBuilder::new().build(&g);
        let result = GossipAverager::new().average(&DenseMatrix::zeros(4, 2), &w, 1);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 4
            })
        ));
    }
}
