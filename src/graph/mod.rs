//! Graph Module
//!
//! Static contact network consumed by the training loop:
//! - Struct-of-arrays node storage (features, labels, names)
//! - Undirected adjacency with degree and neighbour queries
//! - Connected component labelling

pub mod components;
pub mod model;

pub use components::Components;
pub use model::{GraphBuilder, GraphModel};
