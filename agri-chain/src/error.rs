//! Error types for the anchoring layer

use thiserror::Error;

/// Anchoring operation errors.
///
/// The `Display` strings surface verbatim inside the ingest rejection
/// message (`"blockchain submit failed: <error>"`), so their wording is
/// part of the external contract.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Connect/send/read/decode failure on the RPC transport
    #[error("rpc transport error: {0}")]
    Transport(String),

    /// Non-2xx HTTP response from the RPC endpoint
    #[error("rpc http status {0}")]
    HttpStatus(u16),

    /// Semantic JSON-RPC error object, already rendered
    #[error("{0}")]
    Rpc(String),

    #[error("missing transaction hash in rpc response")]
    MissingTxHash,

    #[error("from/to address not configured")]
    AddressNotConfigured,
}

impl ChainError {
    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// Transport failures and server-side (>= 500) statuses are transient;
    /// client errors and semantic RPC errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ChainError::Transport(_) => true,
            ChainError::HttpStatus(status) => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for anchoring operations
pub type ChainResult<T> = Result<T, ChainError>;
