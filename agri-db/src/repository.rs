//! Repository capability set

use agri_core::{BlockchainReceipt, TelemetryPacket, TelemetryRecord};

use crate::error::StoreResult;

/// Storage of telemetry records and their anchoring receipts.
///
/// Implementations serialize all operations internally; callers may share
/// one instance across tasks. Record ids are allocated starting at 1,
/// strictly monotonic, and never reused within an instance's lifetime,
/// even after a delete.
pub trait TelemetryRepository: Send + Sync {
    /// Persist an owned copy of `packet` and return the new record id.
    fn save(&self, packet: &TelemetryPacket) -> StoreResult<u64>;

    /// Bind a receipt to an existing record and index it by transaction
    /// hash. Returns false when the record does not exist. Re-attaching
    /// the same receipt is idempotent; binding a transaction hash that
    /// already belongs to another record is a conflict.
    fn attach_receipt(&self, record_id: u64, receipt: &BlockchainReceipt) -> StoreResult<bool>;

    /// Remove a record and all of its index entries. Returns true iff a
    /// record was removed. Used by the ingest rollback path only.
    fn delete(&self, record_id: u64) -> StoreResult<bool>;

    /// The record with the highest `(timestamp, record_id)` for a device.
    fn latest_by_device(&self, device_id: &str) -> StoreResult<Option<TelemetryRecord>>;

    /// The unique record whose receipt bears `tx_hash`.
    fn find_by_transaction(&self, tx_hash: &str) -> StoreResult<Option<TelemetryRecord>>;

    /// All records of a non-empty batch code, ordered by
    /// `(timestamp ASC, record_id ASC)`. An empty batch code yields an
    /// empty result.
    fn find_by_batch(&self, batch_code: &str) -> StoreResult<Vec<TelemetryRecord>>;

    /// Current record count.
    fn size(&self) -> StoreResult<u64>;
}
