//! Per-node model parameters and the personalized classifiers they define.

use crate::core::{Error, NodeId, Result};
use crate::federated::loss::LogisticLoss;
use crate::graph::GraphModel;
use serde::{Deserialize, Serialize};

/// Weights and biases of every node, stored struct-of-arrays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterRecord")]
pub struct NodeParameters {
    /// Features per node
    feature_dim: usize,
    /// Row-major weights, `node_count * feature_dim`
    weights: Vec<f64>,
    /// One bias per node
    biases: Vec<f64>,
}

#[derive(Deserialize)]
struct ParameterRecord {
    feature_dim: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl TryFrom<ParameterRecord> for NodeParameters {
    type Error = Error;

    fn try_from(record: ParameterRecord) -> Result<Self> {
        let expected = record.biases.len().saturating_mul(record.feature_dim);
        if record.weights.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: record.weights.len(),
            });
        }
        Ok(Self {
            feature_dim: record.feature_dim,
            weights: record.weights,
            biases: record.biases,
        })
    }
}

impl NodeParameters {
    /// All-zero parameters for `node_count` nodes.
    pub fn zeros(node_count: usize, feature_dim: usize) -> Self {
        Self {
            feature_dim,
            weights: vec![0.0; node_count * feature_dim],
            biases: vec![0.0; node_count],
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.biases.len()
    }

    /// Features per node.
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// Weight vector of a node.
    pub fn weights(&self, node: NodeId) -> &[f64] {
        let start = node * self.feature_dim;
        &self.weights[start..start + self.feature_dim]
    }

    /// Bias of a node.
    pub fn bias(&self, node: NodeId) -> f64 {
        self.biases[node]
    }

    /// Take one descent step for a node. `gradient` is `[d/db, d/dw...]`.
    pub fn descend(&mut self, node: NodeId, gradient: &[f64], step_size: f64) {
        self.biases[node] -= step_size * gradient[0];
        let start = node * self.feature_dim;
        for (w, g) in self.weights[start..start + self.feature_dim]
            .iter_mut()
            .zip(&gradient[1..])
        {
            *w -= step_size * g;
        }
    }

    /// The classifier of one node.
    pub fn classifier(&self, node: NodeId) -> PersonalizedClassifier {
        PersonalizedClassifier {
            weights: self.weights(node).to_vec(),
            bias: self.bias(node),
        }
    }

    /// Score each node's classifier on that node's own sample.
    pub fn evaluate(&self, graph: &GraphModel) -> Result<Evaluation> {
        if graph.node_count() != self.node_count() {
            return Err(Error::DimensionMismatch {
                expected: self.node_count(),
                actual: graph.node_count(),
            });
        }
        if graph.feature_dim() != self.feature_dim {
            return Err(Error::DimensionMismatch {
                expected: self.feature_dim,
                actual: graph.feature_dim(),
            });
        }

        let mut eval = Evaluation::default();
        for node in 0..self.node_count() {
            let predicted = self.classifier(node).predict(graph.features(node));
            match (predicted, graph.label(node)) {
                (1, 1) => eval.true_positives += 1,
                (0, 0) => eval.true_negatives += 1,
                (1, _) => eval.false_positives += 1,
                _ => eval.false_negatives += 1,
            }
        }
        Ok(eval)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Linear classifier `predict(x) = 1 if w·x + b >= 0 else 0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedClassifier {
    /// Weight vector
    pub weights: Vec<f64>,
    /// Intercept
    pub bias: f64,
}

impl PersonalizedClassifier {
    /// Linear predictor value.
    pub fn decision_value(&self, features: &[f64]) -> f64 {
        LogisticLoss::decision_value(&self.weights, self.bias, features)
    }

    /// Estimated probability of a positive label.
    pub fn probability(&self, features: &[f64]) -> f64 {
        LogisticLoss::probability(&self.weights, self.bias, features)
    }

    /// Hard 0/1 prediction.
    pub fn predict(&self, features: &[f64]) -> u8 {
        u8::from(self.decision_value(features) >= 0.0)
    }
}

/// Confusion counts over all nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Label 1, predicted 1
    pub true_positives: usize,
    /// Label 0, predicted 0
    pub true_negatives: usize,
    /// Label 0, predicted 1
    pub false_positives: usize,
    /// Label 1, predicted 0
    pub false_negatives: usize,
}

impl Evaluation {
    /// Number of scored nodes.
    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Fraction of correct predictions (0 when nothing was scored).
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.true_positives + self.true_negatives) as f64 / total as f64,
        }
    }
}
