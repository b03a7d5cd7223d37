//! Consensus Module
//!
//! Distributed averaging over the contact network:
//! - Metropolis-Hastings weight matrix (symmetric, row-stochastic)
//! - Synchronous gossip rounds with optional early exit
//! - Exact per-component averages for reference

pub mod gossip;
pub mod weights;

pub use gossip::{component_average, GossipAverager, GossipOutcome};
pub use weights::{ConsensusWeightBuilder, WeightMatrix};
