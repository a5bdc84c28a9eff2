//! SQLite schema for the telemetry store
//!
//! `record_id` is AUTOINCREMENT so rollback deletes can never cause id
//! reuse. `tx_hash` carries a unique index: one anchored record per chain
//! transaction.

/// Idempotent DDL; safe to run on every startup.
pub const CREATE_TELEMETRY_RECORDS: &str = "
CREATE TABLE IF NOT EXISTS telemetry_records (
    record_id INTEGER PRIMARY KEY AUTOINCREMENT,
    device_id TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    telemetry_json TEXT NOT NULL,
    hash_hex TEXT NOT NULL,
    signature TEXT NOT NULL,
    pub_key_id TEXT NOT NULL,
    transport TEXT NOT NULL,
    batch_code TEXT,
    tx_hash TEXT,
    block_height INTEGER,
    submitted_at TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_telemetry_device_time
    ON telemetry_records(device_id, timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_telemetry_batch
    ON telemetry_records(batch_code);
CREATE UNIQUE INDEX IF NOT EXISTS idx_telemetry_tx_hash
    ON telemetry_records(tx_hash);
";

/// Column list shared by every record-producing query.
pub const RECORD_COLUMNS: &str = "record_id, device_id, timestamp, telemetry_json, hash_hex, \
     signature, pub_key_id, transport, batch_code, tx_hash, block_height, submitted_at";
