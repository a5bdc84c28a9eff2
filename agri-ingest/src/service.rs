//! Ingest service

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tracing::{debug, info, warn};

use agri_chain::BlockchainClient;
use agri_core::canon::{canonical_input, sha256_hex};
use agri_core::codec::is_hex64;
use agri_core::crypto::SignatureVerifier;
use agri_core::{BlockchainReceipt, IngestResult, MetricsSnapshot, TelemetryPacket};
use agri_db::TelemetryRepository;

#[derive(Debug, Default)]
struct MetricsState {
    total_requests: u64,
    accepted_requests: u64,
    rejected_requests: u64,
    total_processing_ms: u64,
}

/// Orchestrates the ingest transaction and owns the ingest metrics.
///
/// Collaborators are injected at the composition root. The metrics lock is
/// separate from the repository lock, and no lock is held across the
/// blockchain call: concurrent ingests may interleave and be anchored in
/// any order.
pub struct IngestService {
    repository: Arc<dyn TelemetryRepository>,
    verifier: Arc<dyn SignatureVerifier>,
    blockchain: Arc<dyn BlockchainClient>,
    metrics: Mutex<MetricsState>,
}

impl IngestService {
    pub fn new(
        repository: Arc<dyn TelemetryRepository>,
        verifier: Arc<dyn SignatureVerifier>,
        blockchain: Arc<dyn BlockchainClient>,
    ) -> Self {
        Self {
            repository,
            verifier,
            blockchain,
            metrics: Mutex::new(MetricsState::default()),
        }
    }

    /// Run the ingest transaction for one packet.
    ///
    /// Never fails: every anomaly is folded into a rejected
    /// [`IngestResult`] with a stable message. On acceptance the
    /// repository holds the record with its receipt bound; on rejection no
    /// record remains (advisory suffix on the message when the rollback
    /// itself misbehaves).
    pub async fn ingest(&self, packet: &TelemetryPacket) -> IngestResult {
        let started = Instant::now();
        let mut result = IngestResult::default();

        match self.run_stages(packet, &mut result).await {
            Ok(receipt) => {
                result.accepted = true;
                result.message = "accepted".to_owned();
                result.receipt = Some(receipt);
            }
            Err(message) => {
                result.accepted = false;
                result.message = message;
            }
        }

        result.processing_ms = started.elapsed().as_millis() as u64;
        self.record_outcome(result.accepted, result.processing_ms);

        if result.accepted {
            info!(
                device_id = %packet.device_id,
                record_id = result.record_id,
                processing_ms = result.processing_ms,
                "packet ingested"
            );
        } else {
            debug!(
                device_id = %packet.device_id,
                message = %result.message,
                "packet rejected"
            );
        }

        result
    }

    async fn run_stages(
        &self,
        packet: &TelemetryPacket,
        result: &mut IngestResult,
    ) -> Result<BlockchainReceipt, String> {
        if packet.device_id.is_empty() {
            return Err("deviceId is required".to_owned());
        }
        if packet.timestamp == 0 {
            return Err("timestamp must be positive".to_owned());
        }
        if packet.telemetry_json.is_empty() {
            return Err("telemetry payload is required".to_owned());
        }
        if !is_hex64(&packet.hash_hex) {
            return Err("hash must be 64 hex characters".to_owned());
        }

        let canonical =
            canonical_input(&packet.device_id, packet.timestamp, &packet.telemetry_json);
        if sha256_hex(canonical.as_bytes()) != packet.hash_hex {
            return Err("hash mismatch with payload".to_owned());
        }

        if !self.verifier.verify(packet) {
            return Err("signature verification failed".to_owned());
        }

        let record_id = self
            .repository
            .save(packet)
            .map_err(|error| format!("storage save failed: {error}"))?;
        result.record_id = record_id;

        let receipt = match self
            .blockchain
            .submit_hash(&packet.hash_hex, &packet.device_id, packet.timestamp)
            .await
        {
            Ok(receipt) => receipt,
            Err(error) => {
                let rollback_suffix = self.rollback_best_effort(record_id);
                return Err(format!("blockchain submit failed: {error}{rollback_suffix}"));
            }
        };

        match self.repository.attach_receipt(record_id, &receipt) {
            Ok(true) => Ok(receipt),
            Ok(false) => {
                let rollback_suffix = self.rollback_best_effort(record_id);
                Err(format!(
                    "receipt persistence failed after blockchain submit{rollback_suffix}"
                ))
            }
            Err(error) => {
                warn!(record_id, error = %error, "receipt binding failed");
                let rollback_suffix = self.rollback_best_effort(record_id);
                Err(format!(
                    "receipt persistence failed after blockchain submit{rollback_suffix}"
                ))
            }
        }
    }

    /// Delete a record that must not survive a failed ingest. The returned
    /// suffix is appended to the rejection so the caller sees both faults;
    /// a rollback failure never masks the original cause.
    fn rollback_best_effort(&self, record_id: u64) -> String {
        match self.repository.delete(record_id) {
            Ok(true) => String::new(),
            Ok(false) => "; rollback delete did not remove record".to_owned(),
            Err(error) => {
                warn!(record_id, error = %error, "rollback delete failed");
                format!("; rollback delete failed: {error}")
            }
        }
    }

    /// Point-in-time metrics view.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        let metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);

        let average_processing_ms = if metrics.total_requests == 0 {
            0
        } else {
            metrics.total_processing_ms / metrics.total_requests
        };

        MetricsSnapshot {
            total_requests: metrics.total_requests,
            accepted_requests: metrics.accepted_requests,
            rejected_requests: metrics.rejected_requests,
            average_processing_ms,
            repository_size: self.repository.size().unwrap_or(0),
        }
    }

    fn record_outcome(&self, accepted: bool, processing_ms: u64) {
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        metrics.total_requests += 1;
        if accepted {
            metrics.accepted_requests += 1;
        } else {
            metrics.rejected_requests += 1;
        }
        metrics.total_processing_ms += processing_ms;
    }
}
