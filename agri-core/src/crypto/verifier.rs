//! Packet signature verification
//!
//! The firmware signs the ASCII hex digest (the 64-character string, not
//! the 32 raw bytes) with ECDSA-P256-SHA256 and transmits the DER signature
//! hex-encoded. Verification here must mirror that exactly.

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use tracing::trace;

use super::keys::PublicKeyMap;
use crate::codec::is_hex64;
use crate::types::TelemetryPacket;

/// Minimum accepted signature length, in characters
const MIN_SIGNATURE_CHARS: usize = 16;

/// Capability to validate a packet's signature against a known key.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, packet: &TelemetryPacket) -> bool;
}

/// Verification backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerifierMode {
    /// ECDSA-P256-SHA256 over PEM public keys (deployment default)
    #[default]
    Ecdsa,
    /// Accept `hash + ":" + pubKeyId`; tests and sandbox deployments only
    Stub,
}

/// Signature verifier backed by a fixed public key set.
///
/// The key map is loaded once at startup and immutable afterwards.
pub struct BasicSignatureVerifier {
    public_keys: PublicKeyMap,
    mode: VerifierMode,
}

impl BasicSignatureVerifier {
    /// Create a verifier in the default (ECDSA) mode.
    pub fn new(public_keys: PublicKeyMap) -> Self {
        Self::with_mode(public_keys, VerifierMode::default())
    }

    /// Create a verifier with an explicit mode.
    pub fn with_mode(public_keys: PublicKeyMap, mode: VerifierMode) -> Self {
        Self { public_keys, mode }
    }

    fn verify_ecdsa(pem: &str, hash_hex: &str, signature_hex: &str) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_public_key_pem(pem) else {
            trace!("public key PEM did not parse as P-256 SPKI");
            return false;
        };
        let Ok(signature_der) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_der(&signature_der) else {
            return false;
        };
        verifying_key.verify(hash_hex.as_bytes(), &signature).is_ok()
    }
}

impl SignatureVerifier for BasicSignatureVerifier {
    fn verify(&self, packet: &TelemetryPacket) -> bool {
        if packet.device_id.is_empty() || packet.pub_key_id.is_empty() {
            return false;
        }
        if !is_hex64(&packet.hash_hex) {
            return false;
        }
        if packet.signature.len() < MIN_SIGNATURE_CHARS {
            return false;
        }

        let Some(pem) = self.public_keys.get(&packet.pub_key_id) else {
            return false;
        };

        match self.mode {
            VerifierMode::Ecdsa => Self::verify_ecdsa(pem, &packet.hash_hex, &packet.signature),
            VerifierMode::Stub => {
                packet.signature == format!("{}:{}", packet.hash_hex, packet.pub_key_id)
            }
        }
    }
}
