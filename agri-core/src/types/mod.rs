//! Core type definitions for the telemetry gateway
//!
//! Naming conventions:
//! - snake_case for field names
//! - *_id suffix for identifiers
//! - *_hex suffix for hex-encoded digests

mod metrics;
mod packet;
mod receipt;
mod record;

pub use metrics::*;
pub use packet::*;
pub use receipt::*;
pub use record::*;
