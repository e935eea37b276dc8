//! Error types for taskline-core

use thiserror::Error;

use crate::sync::RemoteError;

/// Result type alias using taskline-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in taskline-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Task not found
    #[error("Task not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote authority error outside of a reconciliation pass
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Reconciliation pass aborted by a systemic remote failure
    #[error("Sync failed: {0}")]
    Sync(String),
}
