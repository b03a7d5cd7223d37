//! Federated training loop.
//!
//! Every outer iteration computes each node's local logistic-loss gradient,
//! gossips the N×(d+1) gradient matrix over the consensus weights, and then
//! moves each node's parameters against its own averaged gradient. After
//! enough gossip rounds every node in a connected component steps with the
//! component-wide mean gradient; nodes in different components never share
//! information.

use crate::consensus::{ConsensusWeightBuilder, GossipAverager, GossipOutcome, WeightMatrix};
use crate::core::{l2_norm, now, DenseMatrix, Error, NodeId, Result, Timestamp};
use crate::federated::classifier::{NodeParameters, PersonalizedClassifier};
use crate::federated::config::TrainerConfig;
use crate::federated::loss::LogisticLoss;
use crate::graph::GraphModel;
use crate::monitoring::TrainingMetrics;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Statistics of one outer iteration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    /// Zero-based outer iteration index
    pub iteration: usize,
    /// Mean per-node loss before this iteration's update
    pub mean_loss: f64,
    /// Largest L2 norm among the averaged gradients
    pub max_gradient_norm: f64,
    /// Gossip rounds applied
    pub consensus_rounds: usize,
}

/// Summary of a call to [`FederatedTrainer::train`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Unique run identifier
    pub run_id: uuid::Uuid,
    /// When training started
    pub started_at: Timestamp,
    /// When training finished
    pub finished_at: Timestamp,
    /// Outer iterations actually run
    pub iterations_run: usize,
    /// Whether the gradient tolerance ended training before the iteration limit
    pub stopped_early: bool,
    /// Per-iteration statistics
    pub history: Vec<IterationStats>,
}

impl TrainingReport {
    /// Mean loss recorded by the last iteration.
    pub fn final_loss(&self) -> Option<f64> {
        self.history.last().map(|s| s.mean_loss)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Trains one personalized logistic classifier per node.
pub struct FederatedTrainer<'g> {
    /// Frozen contact network
    graph: &'g GraphModel,
    /// Consensus weights derived once from the graph
    weights: WeightMatrix,
    /// Training configuration
    config: TrainerConfig,
    /// Gradient averager
    averager: GossipAverager,
    /// Per-node weights and biases
    params: NodeParameters,
    /// Training metrics
    metrics: TrainingMetrics,
    /// Outer iterations completed
    iteration: usize,
}

impl<'g> FederatedTrainer<'g> {
    /// Create a trainer with Metropolis-Hastings weights for `graph`.
    pub fn new(graph: &'g GraphModel, config: TrainerConfig) -> Result<Self> {
        let weights = ConsensusWeightBuilder::new().build(graph);
        Self::with_weights(graph, weights, config)
    }

    /// Create a trainer with a precomputed weight matrix.
    pub fn with_weights(
        graph: &'g GraphModel,
        weights: WeightMatrix,
        config: TrainerConfig,
    ) -> Result<Self> {
        config.validate()?;
        if weights.order() != graph.node_count() {
            return Err(Error::DimensionMismatch {
                expected: graph.node_count(),
                actual: weights.order(),
            });
        }
        if config.consensus_iterations == 0 && graph.edge_count() > 0 {
            warn!(
                edges = graph.edge_count(),
                "consensus_iterations is 0; nodes will train on local gradients only"
            );
        }

        let averager = GossipAverager::new()
            .with_optional_tolerance(config.consensus_tolerance)
            .with_parallel(config.parallel);

        Ok(Self {
            graph,
            weights,
            averager,
            params: NodeParameters::zeros(graph.node_count(), graph.feature_dim()),
            metrics: TrainingMetrics::new(),
            iteration: 0,
            config,
        })
    }

    /// Local gradient of every node at the current parameters, one row per node.
    pub fn local_gradients(&self) -> DenseMatrix {
        let cols = self.graph.feature_dim() + 1;
        let mut gradients = DenseMatrix::zeros(self.graph.node_count(), cols);

        if self.config.parallel {
            gradients
                .as_mut_slice()
                .par_chunks_mut(cols)
                .enumerate()
                .for_each(|(node, row)| self.local_gradient(node, row));
        } else {
            gradients
                .as_mut_slice()
                .chunks_mut(cols)
                .enumerate()
                .for_each(|(node, row)| self.local_gradient(node, row));
        }

        gradients
    }

    fn local_gradient(&self, node: NodeId, out: &mut [f64]) {
        LogisticLoss::gradient_into(
            self.params.weights(node),
            self.params.bias(node),
            self.graph.features(node),
            f64::from(self.graph.label(node)),
            out,
        );
    }

    /// Mean per-node loss at the current parameters (0 for an empty graph).
    pub fn mean_loss(&self) -> f64 {
        let n = self.graph.node_count();
        if n == 0 {
            return 0.0;
        }
        let total: f64 = (0..n)
            .map(|node| {
                LogisticLoss::loss(
                    self.params.weights(node),
                    self.params.bias(node),
                    self.graph.features(node),
                    f64::from(self.graph.label(node)),
                )
            })
            .sum();
        total / n as f64
    }

    /// Run one outer iteration: local gradients, gossip, descent.
    pub fn step(&mut self) -> Result<IterationStats> {
        let mean_loss = self.mean_loss();
        let gradients = self.local_gradients();

        let GossipOutcome {
            estimate: averaged,
            rounds,
            ..
        } = self
            .averager
            .run(gradients, &self.weights, self.config.consensus_iterations)?;

        let mut max_gradient_norm = 0.0_f64;
        for (node, gradient) in averaged.iter_rows().enumerate() {
            self.params.descend(node, gradient, self.config.step_size);
            max_gradient_norm = max_gradient_norm.max(l2_norm(gradient));
        }

        let stats = IterationStats {
            iteration: self.iteration,
            mean_loss,
            max_gradient_norm,
            consensus_rounds: rounds,
        };
        self.iteration += 1;
        self.metrics.record_iteration(rounds, mean_loss, max_gradient_norm);

        debug!(
            iteration = stats.iteration,
            mean_loss,
            max_gradient_norm,
            consensus_rounds = rounds,
            "Completed training iteration"
        );

        Ok(stats)
    }

    /// Run up to `training_iterations` outer iterations.
    ///
    /// Stops early only when a gradient tolerance is configured and every
    /// averaged gradient norm falls to or below it.
    pub fn train(&mut self) -> Result<TrainingReport> {
        let run_id = uuid::Uuid::new_v4();
        let started_at = now();
        let limit = self.config.training_iterations;

        info!(
            %run_id,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            components = self.graph.components().count(),
            step_size = self.config.step_size,
            consensus_iterations = self.config.consensus_iterations,
            training_iterations = limit,
            "Starting federated training"
        );

        let mut history = Vec::with_capacity(limit);
        let mut stopped_early = false;

        while history.len() < limit {
            let stats = self.step()?;
            let converged = self
                .config
                .gradient_tolerance
                .map_or(false, |tolerance| stats.max_gradient_norm <= tolerance);
            history.push(stats);

            if converged {
                stopped_early = history.len() < limit;
                break;
            }
        }

        let report = TrainingReport {
            run_id,
            started_at,
            finished_at: now(),
            iterations_run: history.len(),
            stopped_early,
            history,
        };

        info!(
            %run_id,
            iterations = report.iterations_run,
            stopped_early,
            final_loss = self.mean_loss(),
            "Finished federated training"
        );

        Ok(report)
    }

    /// The graph being trained on.
    pub fn graph(&self) -> &GraphModel {
        self.graph
    }

    /// Training configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Consensus weights in use.
    pub fn weight_matrix(&self) -> &WeightMatrix {
        &self.weights
    }

    /// Current per-node parameters.
    pub fn parameters(&self) -> &NodeParameters {
        &self.params
    }

    /// Consume the trainer, keeping the trained parameters.
    pub fn into_parameters(self) -> NodeParameters {
        self.params
    }

    /// Current classifier of one node.
    pub fn classifier(&self, node: NodeId) -> PersonalizedClassifier {
        self.params.classifier(node)
    }

    /// Training metrics.
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Outer iterations completed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }
}
