//! Federated Learning Module
//!
//! Personalized logistic regression over a contact network:
//! - Local gradients from each node's own sample
//! - Gradient averaging by gossip over Metropolis-Hastings weights
//! - Per-node descent, yielding one classifier per node

pub mod classifier;
pub mod config;
pub mod loss;
pub mod trainer;

pub use classifier::{Evaluation, NodeParameters, PersonalizedClassifier};
pub use config::TrainerConfig;
pub use loss::{sigmoid, LogisticLoss};
pub use trainer::{FederatedTrainer, IterationStats, TrainingReport};
