//! # contact-fl - Personalized learning over contact networks
//!
//! Trains one logistic-regression classifier per individual in a contact
//! network without pooling data:
//! - **Graph**: static contact network with per-node features and labels
//! - **Consensus**: Metropolis-Hastings weights and gossip averaging
//! - **Federated**: local gradients, averaged gradients, per-node descent
//!
//! ## Quick Start
//!
//! ```rust
//! use contact_fl::federated::{FederatedTrainer, TrainerConfig};
//! use contact_fl::graph::GraphModel;
//!
//! let features = vec![vec![0.2, 1.0, -0.5, 0.0, 0.3, 0.9]; 3];
//! let labels = vec![1, 0, 1];
//! let graph = GraphModel::new(features, labels, &[(0, 1), (1, 2)]).unwrap();
//!
//! let mut trainer = FederatedTrainer::new(&graph, TrainerConfig::default()).unwrap();
//! let report = trainer.train().unwrap();
//! assert_eq!(report.iterations_run, 10);
//!
//! let classifier = trainer.classifier(0);
//! let prediction = classifier.predict(graph.features(0));
//! assert!(prediction <= 1);
//! ```

pub mod consensus;
pub mod core;
pub mod federated;
pub mod graph;
pub mod monitoring;

pub use crate::core::error::{Error, Result};
