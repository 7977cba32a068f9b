//! Error types for airq-store.

use std::path::PathBuf;

/// Result type for airq-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in airq-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A slot value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another thread panicked while holding the connection lock.
    #[error("Store lock poisoned")]
    LockPoisoned,
}
