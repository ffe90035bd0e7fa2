//! Error types for recall-vector.

use thiserror::Error;

/// Result type for recall-vector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in recall-vector operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Two vectors (or a vector and the index) disagree on dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions.
        expected: usize,
        /// Actual dimensions provided.
        actual: usize,
    },

    /// Vector has no components.
    #[error("Vector '{0}' is empty")]
    EmptyVector(String),

    /// Invalid vector (e.g. contains infinities).
    #[error("Invalid vector: {0}")]
    InvalidVector(String),
}
