//! Signature verification against the deployed public key set

mod keys;
mod verifier;

pub use keys::{load_public_keys, PublicKeyMap};
pub use verifier::{BasicSignatureVerifier, SignatureVerifier, VerifierMode};
