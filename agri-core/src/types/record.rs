//! Persisted telemetry record and the ingest outcome

use serde::{Deserialize, Serialize};

use super::packet::TelemetryPacket;
use super::receipt::BlockchainReceipt;

/// A packet after acceptance, owned by the repository.
///
/// `record_id` starts at 1 and is never reused within a repository
/// instance, even after a rollback delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub record_id: u64,
    pub packet: TelemetryPacket,
    /// Anchoring proof; absent until the receipt is bound
    pub receipt: Option<BlockchainReceipt>,
}

/// Outcome of one ingest invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestResult {
    pub accepted: bool,
    /// "accepted" or a stable rejection message
    pub message: String,
    /// Assigned record id; 0 when the packet never reached the store
    pub record_id: u64,
    pub receipt: Option<BlockchainReceipt>,
    /// Wall-clock processing time in whole milliseconds
    pub processing_ms: u64,
}
