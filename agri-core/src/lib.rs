//! Agri Core - Telemetry Gateway Domain Layer
//!
//! This crate provides the shared domain model for the agri telemetry
//! gateway:
//! - Signed telemetry envelope types (packet, record, receipt)
//! - The envelope codec shared with the device firmware
//! - Canonical hashing and timestamp helpers
//! - Signature verification against the deployed public key set
//!
//! The wire protocol is shared with the embedded firmware: the canonical
//! hash input and the envelope field names must not drift.

pub mod canon;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod types;

pub use error::{CodecError, CodecResult};
pub use types::*;
