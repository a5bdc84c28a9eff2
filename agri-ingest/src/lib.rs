//! Agri Ingest - The Ingest Transaction
//!
//! Orchestrates the multi-stage ingest of one telemetry packet across the
//! local store and the remote chain: shape checks, hash binding, signature
//! verification, persistence, anchoring, receipt binding. Partial failures
//! must never leave an orphan record or lose an anchoring receipt, so the
//! pipeline pins a strict order (store first, anchor second, bind third)
//! and compensates with a best-effort rollback delete.

pub mod service;

pub use service::IngestService;
