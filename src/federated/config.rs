//! Training configuration.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for [`FederatedTrainer`](crate::federated::FederatedTrainer).
///
/// With both tolerances unset the trainer runs exactly
/// `training_iterations` outer steps of `consensus_iterations` gossip
/// rounds each.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Gradient descent step size (alpha)
    pub step_size: f64,
    /// Gossip rounds per outer iteration (R)
    pub consensus_iterations: usize,
    /// Outer training iterations (T)
    pub training_iterations: usize,
    /// End a gossip run once a round changes no entry by more than this
    pub consensus_tolerance: Option<f64>,
    /// End training once every averaged gradient norm is at most this
    pub gradient_tolerance: Option<f64>,
    /// Use rayon for per-node work
    pub parallel: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            step_size: 0.1,
            consensus_iterations: 50,
            training_iterations: 10,
            consensus_tolerance: None,
            gradient_tolerance: None,
            parallel: false,
        }
    }
}

impl TrainerConfig {
    /// Set step size.
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    /// Set gossip rounds per outer iteration.
    pub fn with_consensus_iterations(mut self, iterations: usize) -> Self {
        self.consensus_iterations = iterations;
        self
    }

    /// Set outer iterations.
    pub fn with_training_iterations(mut self, iterations: usize) -> Self {
        self.training_iterations = iterations;
        self
    }

    /// Enable gossip early exit.
    pub fn with_consensus_tolerance(mut self, tolerance: f64) -> Self {
        self.consensus_tolerance = Some(tolerance);
        self
    }

    /// Enable training early exit.
    pub fn with_gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = Some(tolerance);
        self
    }

    /// Enable or disable rayon.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "step_size must be finite and positive, got {}",
                self.step_size
            )));
        }
        for (name, tolerance) in [
            ("consensus_tolerance", self.consensus_tolerance),
            ("gradient_tolerance", self.gradient_tolerance),
        ] {
            if let Some(t) = tolerance {
                if !t.is_finite() || t < 0.0 {
                    return Err(Error::InvalidConfig(format!(
                        "{} must be finite and non-negative, got {}",
                        name, t
                    )));
                }
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainerConfig::default();
        assert_eq!(config.step_size, 0.1);
        assert_eq!(config.consensus_iterations, 50);
        assert_eq!(config.training_iterations, 10);
        assert!(config.consensus_tolerance.is_none());
        assert!(config.gradient_tolerance.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        assert!(TrainerConfig::default().with_step_size(0.0).validate().is_err());
        assert!(TrainerConfig::default()
            .with_step_size(f64::NAN)
            .validate()
            .is_err());
        assert!(TrainerConfig::default()
            .with_gradient_tolerance(-1.0)
            .validate()
            .is_err());
        assert!(TrainerConfig::default()
            .with_consensus_tolerance(f64::INFINITY)
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_json() {
        let config = TrainerConfig::from_json_str(r#"{"step_size": 0.05, "parallel": true}"#).unwrap();
        assert_eq!(config.step_size, 0.05);
        assert!(config.parallel);
        assert_eq!(config.consensus_iterations, 50);
    }

    #[test]
    fn test_json_rejects_invalid() {
        let result = TrainerConfig::from_json_str(r#"{"step_size": -1.0}"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = TrainerConfig::from_json_str("not json");
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_json_file() {
        let path = std::env::temp_dir().join(format!("contact-fl-config-{}.json", std::process::id()));
        let config = TrainerConfig::default().with_training_iterations(25);
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        let loaded = TrainerConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);

        assert!(matches!(
            TrainerConfig::from_json_file("/nonexistent/contact-fl.json"),
            Err(Error::Io(_))
        ));
    }
}
