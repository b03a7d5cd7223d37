//! Logistic link function and per-sample loss/gradient.

use crate::core::dot;

/// Numerically stable logistic function `1 / (1 + exp(-z))`.
///
/// Never evaluates `exp` of a positive argument, so it cannot overflow.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + exp(z))` without overflow.
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Logistic regression on a single labelled sample.
///
/// Gradients are laid out as `[d/db, d/dw_1, ..., d/dw_d]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogisticLoss;

impl LogisticLoss {
    /// Linear predictor `w·x + b`.
    pub fn decision_value(weights: &[f64], bias: f64, features: &[f64]) -> f64 {
        dot(weights, features) + bias
    }

    /// Predicted probability of label 1.
    pub fn probability(weights: &[f64], bias: f64, features: &[f64]) -> f64 {
        sigmoid(Self::decision_value(weights, bias, features))
    }

    /// Write the gradient of the cross-entropy loss into `out` (length `d + 1`).
    pub fn gradient_into(weights: &[f64], bias: f64, features: &[f64], label: f64, out: &mut [f64]) {
        let error = Self::probability(weights, bias, features) - label;
        out[0] = error;
        for (g, x) in out[1..].iter_mut().zip(features) {
            *g = error * x;
        }
    }

    /// Gradient of the cross-entropy loss, length `d + 1`.
    pub fn gradient(weights: &[f64], bias: f64, features: &[f64], label: f64) -> Vec<f64> {
        let mut out = vec![0.0; features.len() + 1];
        Self::gradient_into(weights, bias, features, label, &mut out);
        out
    }

    /// Cross-entropy loss `-y ln h - (1 - y) ln (1 - h)`.
    pub fn loss(weights: &[f64], bias: f64, features: &[f64], label: f64) -> f64 {
        let z = Self::decision_value(weights, bias, features);
        softplus(z) - label * z
    }
}
