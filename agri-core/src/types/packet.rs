//! The signed telemetry envelope submitted by field devices

use serde::{Deserialize, Serialize};

/// A signed telemetry envelope from a device.
///
/// `telemetry_json` carries the exact bytes the sender hashed: it is the
/// raw substring extracted from the ingest request and is never
/// re-serialized (re-serializing could reorder keys or reformat numbers
/// and silently break the hash binding).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryPacket {
    /// Device identifier (non-empty, <= 64 chars by convention)
    pub device_id: String,
    /// Reading time, seconds since the Unix epoch (> 0)
    pub timestamp: u64,
    /// Raw telemetry JSON object, canonical bytes
    pub telemetry_json: String,
    /// SHA-256 of the canonical input, 64 hex chars
    pub hash_hex: String,
    /// Hex-encoded signature over the ASCII digest
    pub signature: String,
    /// Key lookup identifier
    pub pub_key_id: String,
    /// Transport label ("wifi", "lora", ...)
    pub transport: String,
    /// Production batch code; empty when the reading is unbatched
    pub batch_code: String,
}
