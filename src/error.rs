//! Error types for ripfix.
//!
//! Every failure in this crate is an explicit return value. PE header
//! problems carry their own [`PeError`] and fold into [`RipfixError`] when
//! they cross into the crate-wide surface.

use crate::formats::pe::PeError;
use thiserror::Error;

/// Main error type for ripfix operations.
#[derive(Debug, Error)]
pub enum RipfixError {
    /// Structurally invalid or unsupported binary image
    #[error("Invalid binary format: {0}")]
    InvalidFormat(#[from] PeError),

    /// Output capacity reached; partial output is retained by the caller
    #[error("Resource limit exceeded: {resource} ({used}/{limit})")]
    ResourceExhausted {
        resource: String,
        used: usize,
        limit: usize,
    },

    /// Output storage could not be allocated
    #[error("Allocation of {capacity} bytes failed")]
    Allocation { capacity: usize },

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for ripfix operations
pub type Result<T> = std::result::Result<T, RipfixError>;
