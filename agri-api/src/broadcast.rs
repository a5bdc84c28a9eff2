//! Ingest event fan-out
//!
//! One broadcast channel per stream. Publishing never blocks on a
//! subscriber: each upgraded socket holds its own receiver and forwarding
//! task (see [`crate::ws`]), so a slow or dead subscriber only affects
//! itself.

use tokio::sync::{broadcast, watch};
use tracing::warn;

use agri_core::{IngestResult, TelemetryPacket};

use crate::dto::{IngestRejectedEvent, TelemetryIngestedEvent};

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out hub for ingest outcomes.
///
/// Also carries the shutdown flag for the forwarding tasks: the server
/// holds the router (and with it this broadcaster) alive until every
/// connection ends, so subscriber tasks cannot rely on channel closure and
/// are told to stop explicitly.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    telemetry_tx: broadcast::Sender<String>,
    alerts_tx: broadcast::Sender<String>,
    shutdown_tx: watch::Sender<bool>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (telemetry_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (alerts_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            telemetry_tx,
            alerts_tx,
            shutdown_tx,
        }
    }

    /// Publish the outcome of one ingest to the relevant stream.
    pub fn publish_ingest_outcome(&self, packet: &TelemetryPacket, result: &IngestResult) {
        if result.accepted {
            let event = TelemetryIngestedEvent {
                event_type: "telemetry.ingested",
                device_id: packet.device_id.clone(),
                record_id: result.record_id,
                timestamp: packet.timestamp,
                transport: packet.transport.clone(),
                tx_hash: result
                    .receipt
                    .as_ref()
                    .map(|receipt| receipt.tx_hash.clone())
                    .unwrap_or_default(),
            };
            self.send(&self.telemetry_tx, &event);
        } else {
            let event = IngestRejectedEvent {
                event_type: "ingest.rejected",
                device_id: packet.device_id.clone(),
                message: result.message.clone(),
            };
            self.send(&self.alerts_tx, &event);
        }
    }

    /// Subscribe to accepted-ingest events.
    pub fn subscribe_telemetry(&self) -> broadcast::Receiver<String> {
        self.telemetry_tx.subscribe()
    }

    /// Subscribe to rejected-ingest events.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<String> {
        self.alerts_tx.subscribe()
    }

    /// Observe the shutdown flag.
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Tell every stream subscriber to close its socket.
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    fn send<E: serde::Serialize>(&self, channel: &broadcast::Sender<String>, event: &E) {
        if channel.receiver_count() == 0 {
            return;
        }
        match serde_json::to_string(event) {
            // A send error only means every receiver vanished since the
            // count check; nothing to do.
            Ok(payload) => {
                let _ = channel.send(payload);
            }
            Err(error) => warn!(error = %error, "stream event did not serialize"),
        }
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
