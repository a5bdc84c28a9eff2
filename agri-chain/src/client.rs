//! Anchoring capability

use async_trait::async_trait;

use agri_core::BlockchainReceipt;

use crate::error::ChainResult;

/// Capability to anchor a packet digest on a chain.
///
/// Implementations fail with a descriptive [`crate::ChainError`] on any
/// unrecoverable anomaly; the ingest pipeline converts that into a
/// client-visible rejection and rolls the record back.
#[async_trait]
pub trait BlockchainClient: Send + Sync {
    /// Submit `hash_hex` and return the anchoring receipt.
    async fn submit_hash(
        &self,
        hash_hex: &str,
        device_id: &str,
        timestamp: u64,
    ) -> ChainResult<BlockchainReceipt>;
}
