//! Error types for the core domain layer

use thiserror::Error;

/// Envelope decode errors.
///
/// The messages are part of the wire protocol: clients and the QA tooling
/// match on them verbatim. A field of the wrong JSON type is reported the
/// same way as an absent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("missing deviceId")]
    MissingDeviceId,

    #[error("missing timestamp")]
    MissingTimestamp,

    #[error("missing telemetry object")]
    MissingTelemetry,

    #[error("missing hash")]
    MissingHash,

    #[error("missing signature")]
    MissingSignature,
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
