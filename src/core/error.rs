//! Error types for contact-fl.

use thiserror::Error;

/// Result type alias for contact-fl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building graphs or training.
#[derive(Error, Debug)]
pub enum Error {
    // Graph construction errors
    #[error("Node {node} has {actual} features, expected {expected}")]
    FeatureDimensionMismatch {
        node: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Label count mismatch: expected {expected}, got {actual}")]
    LabelCountMismatch { expected: usize, actual: usize },

    #[error("Node {node} has invalid label {label} (must be 0 or 1)")]
    InvalidLabel { node: usize, label: u8 },

    #[error("Node {node} has a non-finite feature at index {index}")]
    NonFiniteFeature { node: usize, index: usize },

    #[error("Feature vectors must have at least one entry")]
    EmptyFeatures,

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Node index {node} out of range for graph with {node_count} nodes")]
    NodeOutOfRange { node: usize, node_count: usize },

    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    #[error("Self-loop on node {0}")]
    SelfLoop(usize),

    // Matrix errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::FeatureDimensionMismatch {
            node: 3,
            expected: 6,
            actual: 5,
        };
        assert_eq!(err.to_string(), "Node 3 has 5 features, expected 6");

        let err = Error::SelfLoop(7);
        assert_eq!(err.to_string(), "Self-loop on node 7");
    }

    #[test]
    fn test_from_serde_json() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
