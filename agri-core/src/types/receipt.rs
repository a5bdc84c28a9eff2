//! Blockchain anchoring receipt

use serde::{Deserialize, Serialize};

/// Proof that a packet digest was anchored to the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainReceipt {
    /// Chain transaction hash; unique across the repository
    pub tx_hash: String,
    /// Block height of inclusion; 0 when not yet known
    pub block_height: u64,
    /// Submission time, RFC 3339 UTC
    pub submitted_at: String,
}
