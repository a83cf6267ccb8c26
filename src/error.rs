//! Error types for trueno-ab
//!
//! Every message names the offending experiment, client or variant so an
//! operator can act on it without reading logs.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-ab error types
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown experiment, or an experiment with nothing to assign
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request conflicts with the experiment's current state
    /// (zero total weight, stopped experiment, foreign variant, bad transition)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Failure reported by the persistence layer
    #[error("Store error: {0}")]
    Store(String),

    /// Uniqueness violation on (experiment, client) assignment insert
    #[error("Assignment already exists for client '{client_id}' in experiment '{experiment_id}'")]
    DuplicateAssignment {
        /// Experiment the insert targeted
        experiment_id: String,
        /// Client the insert targeted
        client_id: String,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Statistical routine rejected its parameters
    #[error("Statistics error: {0}")]
    Statistics(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a lost race on assignment insert.
    #[must_use]
    pub const fn is_duplicate_assignment(&self) -> bool {
        matches!(self, Self::DuplicateAssignment { .. })
    }
}
