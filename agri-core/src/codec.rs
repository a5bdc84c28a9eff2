//! Telemetry envelope codec
//!
//! Decodes the ingest envelope shared with the device firmware and
//! provides the small string-level validators used across the gateway.
//!
//! The `telemetry` member is captured through [`serde_json::value::RawValue`]
//! so the stored string is the exact byte span of the object in the request
//! body. Those bytes are the canonical hash input; reformatting them in any
//! way would invalidate every device signature.

use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{CodecError, CodecResult};
use crate::types::TelemetryPacket;

/// Key id assumed when the envelope does not name one
pub const DEFAULT_PUB_KEY_ID: &str = "default-pubkey";

/// Transport label assumed when the envelope does not name one
pub const DEFAULT_TRANSPORT: &str = "wifi";

#[derive(Debug, Deserialize)]
struct RawEnvelope<'a> {
    #[serde(rename = "deviceId")]
    device_id: Option<Value>,
    timestamp: Option<Value>,
    #[serde(borrow)]
    telemetry: Option<&'a RawValue>,
    hash: Option<Value>,
    signature: Option<Value>,
    #[serde(rename = "pubKeyId")]
    pub_key_id: Option<Value>,
    transport: Option<Value>,
    #[serde(rename = "batchCode")]
    batch_code: Option<Value>,
}

fn required_str(value: &Option<Value>, missing: CodecError) -> CodecResult<String> {
    value
        .as_ref()
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(missing)
}

fn optional_str(value: &Option<Value>, default: &str) -> String {
    value
        .as_ref()
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_owned()
}

/// Decode an ingest request body into a [`TelemetryPacket`].
///
/// Required members: `deviceId` (string), `timestamp` (unsigned integer),
/// `telemetry` (object), `hash` (string), `signature` (string). Optional
/// members default to [`DEFAULT_PUB_KEY_ID`], [`DEFAULT_TRANSPORT`], and an
/// empty batch code. A body that is not a JSON object at all reports the
/// first required member as missing.
pub fn parse_packet(payload: &str) -> CodecResult<TelemetryPacket> {
    let envelope: RawEnvelope<'_> =
        serde_json::from_str(payload).map_err(|_| CodecError::MissingDeviceId)?;

    let device_id = required_str(&envelope.device_id, CodecError::MissingDeviceId)?;

    let timestamp = envelope
        .timestamp
        .as_ref()
        .and_then(Value::as_u64)
        .ok_or(CodecError::MissingTimestamp)?;

    let telemetry = envelope.telemetry.ok_or(CodecError::MissingTelemetry)?;
    let telemetry_json = telemetry.get();
    if !telemetry_json.starts_with('{') {
        return Err(CodecError::MissingTelemetry);
    }

    let hash_hex = required_str(&envelope.hash, CodecError::MissingHash)?;
    let signature = required_str(&envelope.signature, CodecError::MissingSignature)?;

    Ok(TelemetryPacket {
        device_id,
        timestamp,
        telemetry_json: telemetry_json.to_owned(),
        hash_hex,
        signature,
        pub_key_id: optional_str(&envelope.pub_key_id, DEFAULT_PUB_KEY_ID),
        transport: optional_str(&envelope.transport, DEFAULT_TRANSPORT),
        batch_code: optional_str(&envelope.batch_code, ""),
    })
}

/// True iff `value` is exactly 64 hex digits (case-insensitive).
pub fn is_hex64(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Escape a string for embedding in a JSON document.
///
/// Applies the two mandatory escapes (`"` and `\`) plus the C-style short
/// forms for the common control characters. All other bytes pass through
/// unchanged.
pub fn json_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\u{0008}' => escaped.push_str("\\b"),
            '\u{000C}' => escaped.push_str("\\f"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}
