//! Error types for the heading-saccades library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input series or parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Measurement does not match the number of tracked objects
    #[error("Shape mismatch: expected {expected} values per measurement, got {actual}")]
    ShapeMismatch {
        /// Number of values the estimator expects
        expected: usize,
        /// Number of values actually supplied
        actual: usize,
    },

    /// Filter design or processing error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
