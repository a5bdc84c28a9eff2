//! Gateway ingest metrics

use serde::{Deserialize, Serialize};

/// Point-in-time view of the ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub accepted_requests: u64,
    pub rejected_requests: u64,
    /// Integer average; 0 when no requests have been observed
    pub average_processing_ms: u64,
    pub repository_size: u64,
}
