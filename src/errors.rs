//! Errors
//!
//! Custom error types used throughout the `rankeval` crate.
use thiserror::Error;

/// Errors that can occur while validating inputs or evaluating an ensemble.
#[derive(Debug, Error, PartialEq)]
pub enum RankevalError {
    /// First value names the mismatching quantity, second is expected, third is what was found.
    #[error("Shape mismatch for {0}, expected {1} but found {2}.")]
    ShapeMismatch(String, usize, usize),
    /// A node references a feature the dataset does not have.
    #[error("Node {node} of tree {tree} uses feature {feature}, but the dataset only has {n_features} features.")]
    FeatureOutOfRange {
        tree: usize,
        node: usize,
        feature: usize,
        n_features: usize,
    },
    /// The dataset has no instances or no features.
    #[error("The dataset must have at least one instance and one feature, found {0} instances and {1} features.")]
    EmptyDataset(usize, usize),
    /// The tree structure is not a valid forest of binary trees.
    #[error("Malformed ensemble: {0}")]
    MalformedEnsemble(String),
    /// Unable to serialize an object to json.
    #[error("Unable to write object to json: {0}")]
    UnableToWrite(String),
    /// Unable to deserialize an object from json.
    #[error("Unable to read object from json: {0}")]
    UnableToRead(String),
}
