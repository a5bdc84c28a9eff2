//! Gateway configuration
//!
//! Loaded from environment variables with the AGRI_ prefix; every variable
//! is optional and falls back to a sandbox-friendly default.

use std::env;
use std::path::PathBuf;

use agri_core::crypto::VerifierMode;

/// Anchoring backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMode {
    /// Deterministic in-process receipts
    Mock,
    /// Ethereum JSON-RPC endpoint
    Ethereum,
}

/// Top-level gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub http_port: u16,
    pub sqlite_path: PathBuf,
    pub public_keys_dir: PathBuf,
    pub signature_mode: VerifierMode,
    pub chain_mode: ChainMode,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            sqlite_path: PathBuf::from("data/agri_gateway.db"),
            public_keys_dir: PathBuf::from("keys/public"),
            signature_mode: VerifierMode::Ecdsa,
            chain_mode: ChainMode::Mock,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - AGRI_HTTP_PORT: listen port
    /// - AGRI_SQLITE_PATH: database path
    /// - AGRI_PUBLIC_KEYS_DIR: public keys directory
    /// - AGRI_SIGNATURE_MODE: "ecdsa" (default) or "stub"
    /// - AGRI_CHAIN_MODE: "ethereum" selects the RPC client, anything
    ///   else the mock (the Ethereum endpoint itself is configured by the
    ///   AGRI_ETH_ variables, see `agri-chain`)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            http_port: env::var("AGRI_HTTP_PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.http_port),
            sqlite_path: env::var("AGRI_SQLITE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sqlite_path),
            public_keys_dir: env::var("AGRI_PUBLIC_KEYS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_keys_dir),
            signature_mode: env::var("AGRI_SIGNATURE_MODE")
                .map(|value| signature_mode_from(&value))
                .unwrap_or(defaults.signature_mode),
            chain_mode: env::var("AGRI_CHAIN_MODE")
                .map(|value| chain_mode_from(&value))
                .unwrap_or(defaults.chain_mode),
        }
    }
}

fn signature_mode_from(value: &str) -> VerifierMode {
    match value.to_lowercase().as_str() {
        "stub" => VerifierMode::Stub,
        _ => VerifierMode::Ecdsa,
    }
}

fn chain_mode_from(value: &str) -> ChainMode {
    match value.to_lowercase().as_str() {
        "ethereum" => ChainMode::Ethereum,
        _ => ChainMode::Mock,
    }
}
