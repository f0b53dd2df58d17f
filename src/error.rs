//! Error types for the Curio library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`RecommendError`] enum. Failures inside the similarity phase of a
//! recommendation are recovered internally and never reach the caller;
//! the variants below surface only for catalog access, configuration and
//! explicit embedding rebuilds.
//!
//! # Examples
//!
//! ```
//! use curio::error::{RecommendError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(RecommendError::invalid_argument("limit must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Curio operations.
#[derive(Error, Debug)]
pub enum RecommendError {
    /// I/O errors (loading catalogs or configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Catalog collaborator failures
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Vocabulary, vectorization or snapshot failures
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Errors raised by external catalog implementations
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with RecommendError.
pub type Result<T> = std::result::Result<T, RecommendError>;

impl RecommendError {
    /// Create a new catalog error.
    pub fn catalog<S: Into<String>>(msg: S) -> Self {
        RecommendError::Catalog(msg.into())
    }

    /// Create a new embedding error.
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        RecommendError::Embedding(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        RecommendError::Config(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        RecommendError::InvalidArgument(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        RecommendError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        RecommendError::Other(format!("Internal error: {}", msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = RecommendError::catalog("connection refused");
        assert_eq!(error.to_string(), "Catalog error: connection refused");

        let error = RecommendError::embedding("empty vocabulary");
        assert_eq!(error.to_string(), "Embedding error: empty vocabulary");

        let error = RecommendError::config("ratio out of range");
        assert_eq!(error.to_string(), "Configuration error: ratio out of range");

        let error = RecommendError::internal("lock poisoned");
        assert_eq!(error.to_string(), "Error: Internal error: lock poisoned");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = RecommendError::from(io_error);

        match error {
            RecommendError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_anyhow_error_conversion() {
        let error = RecommendError::from(anyhow::anyhow!("backend unavailable"));
        assert!(matches!(error, RecommendError::Anyhow(_)));
        assert!(error.to_string().contains("backend unavailable"));
    }
}
