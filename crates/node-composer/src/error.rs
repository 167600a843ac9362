//! Error types for the node composer
//!
//! Core graph operations are total and never return these. They cover the
//! surfaces that touch bytes: snapshots, JSON loading and configuration.

use thiserror::Error;

/// Result type alias using ComposerError
pub type Result<T> = std::result::Result<T, ComposerError>;

/// Errors that can occur outside the core composition operations
#[derive(Debug, Error)]
pub enum ComposerError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// A loaded graph breaks a structural invariant
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComposerError {
    /// Create an invalid graph error with a message
    pub fn invalid_graph(msg: impl Into<String>) -> Self {
        Self::InvalidGraph(msg.into())
    }
}
