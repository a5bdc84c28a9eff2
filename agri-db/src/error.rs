//! Error types for the storage layer

use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Failure reported by a backend in its own words
    #[error("{0}")]
    Backend(String),

    #[error("storage lock poisoned")]
    LockPoisoned,
}

/// Result type alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
