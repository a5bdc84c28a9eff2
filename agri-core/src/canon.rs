//! Canonical hashing and timestamp helpers
//!
//! The canonical hash input is the `|`-delimited form
//! `deviceId|timestamp|telemetryJson`, shared with the device firmware.
//! Any divergence here invalidates every deployed device, so the format is
//! pinned by the conformance tests below.

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// SHA-256 of `data`, lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Build the canonical hash input for a packet.
pub fn canonical_input(device_id: &str, timestamp: u64, telemetry_json: &str) -> String {
    format!("{device_id}|{timestamp}|{telemetry_json}")
}

/// Current time as an RFC 3339 UTC string with second precision.
pub fn current_utc_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_canonical_input_format() {
        let canonical = canonical_input("stm32-node-1", 1700001000, r#"{"temperature":24.5}"#);
        assert_eq!(canonical, r#"stm32-node-1|1700001000|{"temperature":24.5}"#);
    }

    #[test]
    fn test_canonical_hash_matches_firmware_vector() {
        // The accept-path conformance vector shared with the firmware tests.
        let canonical = canonical_input(
            "stm32-node-1",
            1700001000,
            r#"{"temperature":24.5,"humidity":62.3}"#,
        );
        assert_eq!(
            sha256_hex(canonical.as_bytes()),
            "13daf011866f70210616ef272a0112bdc0bbd09eeadfce3bc91f12a99fb23c1d"
        );
    }

    #[test]
    fn test_current_utc_iso8601_shape() {
        let now = current_utc_iso8601();
        assert!(now.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&now).is_ok());
    }
}
