//! Data Transfer Objects for API responses and stream events
//!
//! Wire field names are camelCase; the `telemetry` member is re-emitted
//! from the stored canonical bytes via `RawValue`, never re-serialized.

use serde::Serialize;
use serde_json::value::RawValue;

use agri_core::{BlockchainReceipt, IngestResult, MetricsSnapshot, TelemetryRecord};

use crate::error::{ApiError, ApiResult};

// ============ Error body ============

/// Uniform error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

// ============ Health ============

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ============ Ingest ============

/// Anchoring receipt projection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub tx_hash: String,
    pub block_height: u64,
    pub submitted_at: String,
}

/// Ingest outcome response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub accepted: bool,
    pub message: String,
    pub record_id: u64,
    pub processing_ms: u64,
    pub receipt: Option<ReceiptResponse>,
}

// ============ Records ============

/// Stored record projection returned by the lookup endpoints.
///
/// `batchCode` is omitted when the reading is unbatched; `receipt` is
/// always present, null until anchored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub record_id: u64,
    pub device_id: String,
    pub timestamp: u64,
    pub telemetry: Box<RawValue>,
    pub hash: String,
    pub signature: String,
    pub pub_key_id: String,
    pub transport: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_code: Option<String>,
    pub receipt: Option<ReceiptResponse>,
}

/// Batch trace response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTraceResponse {
    pub batch_code: String,
    pub count: usize,
    pub records: Vec<RecordResponse>,
}

// ============ Metrics ============

/// Ingest metrics overview
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub total_requests: u64,
    pub accepted_requests: u64,
    pub rejected_requests: u64,
    pub average_processing_ms: u64,
    pub repository_size: u64,
}

// ============ Stream events ============

/// Event sent to `/ws/telemetry` subscribers on every accepted ingest
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryIngestedEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub device_id: String,
    pub record_id: u64,
    pub timestamp: u64,
    pub transport: String,
    /// Empty when the receipt is absent
    pub tx_hash: String,
}

/// Event sent to `/ws/alerts` subscribers on every rejected ingest
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRejectedEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub device_id: String,
    pub message: String,
}

// ============ Mapping helpers ============

pub fn receipt_to_response(receipt: &BlockchainReceipt) -> ReceiptResponse {
    ReceiptResponse {
        tx_hash: receipt.tx_hash.clone(),
        block_height: receipt.block_height,
        submitted_at: receipt.submitted_at.clone(),
    }
}

pub fn ingest_result_to_response(result: &IngestResult) -> IngestResponse {
    IngestResponse {
        accepted: result.accepted,
        message: result.message.clone(),
        record_id: result.record_id,
        processing_ms: result.processing_ms,
        receipt: result.receipt.as_ref().map(receipt_to_response),
    }
}

pub fn record_to_response(record: &TelemetryRecord) -> ApiResult<RecordResponse> {
    let telemetry = RawValue::from_string(record.packet.telemetry_json.clone())
        .map_err(|error| ApiError::Internal(format!("stored telemetry is not valid JSON: {error}")))?;

    let batch_code = if record.packet.batch_code.is_empty() {
        None
    } else {
        Some(record.packet.batch_code.clone())
    };

    Ok(RecordResponse {
        record_id: record.record_id,
        device_id: record.packet.device_id.clone(),
        timestamp: record.packet.timestamp,
        telemetry,
        hash: record.packet.hash_hex.clone(),
        signature: record.packet.signature.clone(),
        pub_key_id: record.packet.pub_key_id.clone(),
        transport: record.packet.transport.clone(),
        batch_code,
        receipt: record.receipt.as_ref().map(receipt_to_response),
    })
}

pub fn metrics_to_response(snapshot: &MetricsSnapshot) -> MetricsResponse {
    MetricsResponse {
        total_requests: snapshot.total_requests,
        accepted_requests: snapshot.accepted_requests,
        rejected_requests: snapshot.rejected_requests,
        average_processing_ms: snapshot.average_processing_ms,
        repository_size: snapshot.repository_size,
    }
}
