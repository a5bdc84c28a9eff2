//! Agri DB - Telemetry Record Storage
//!
//! Storage layer for accepted telemetry records. One durable backend
//! (SQLite) and one volatile backend (in-memory) implement the same
//! [`TelemetryRepository`] capability set; the gateway composes against the
//! trait only.
//!
//! Every operation is atomic with respect to the others: each backend
//! serializes all access through a single internal lock.

pub mod error;
pub mod memory;
pub mod repository;
pub mod schema;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryTelemetryRepository;
pub use repository::TelemetryRepository;
pub use sqlite::SqliteTelemetryRepository;
