//! Ethereum RPC configuration
//!
//! Loaded from environment variables with the AGRI_ETH_ prefix.

use serde::{Deserialize, Serialize};
use std::env;

/// Ethereum JSON-RPC endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthereumRpcConfig {
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Sender account (hex address)
    pub from_address: String,
    /// Recipient account; falls back to `from_address` when empty
    pub to_address: String,
    /// Receipt poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound on receipt polling; a partial receipt is returned when
    /// it elapses
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_wait_ms() -> u64 {
    15_000
}

impl Default for EthereumRpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_owned(),
            from_address: String::new(),
            to_address: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

impl EthereumRpcConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - AGRI_ETH_RPC_URL: RPC endpoint URL
    /// - AGRI_ETH_FROM: sender address
    /// - AGRI_ETH_TO: recipient address (defaults to the sender)
    /// - AGRI_ETH_POLL_MS: receipt poll interval in milliseconds
    /// - AGRI_ETH_MAX_WAIT_MS: receipt polling cap in milliseconds
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            rpc_url: env::var("AGRI_ETH_RPC_URL").unwrap_or(defaults.rpc_url),
            from_address: env::var("AGRI_ETH_FROM").unwrap_or_default(),
            to_address: env::var("AGRI_ETH_TO").unwrap_or_default(),
            poll_interval_ms: positive_ms("AGRI_ETH_POLL_MS", defaults.poll_interval_ms),
            max_wait_ms: positive_ms("AGRI_ETH_MAX_WAIT_MS", defaults.max_wait_ms),
        }
    }
}

fn positive_ms(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|&value| value > 0)
        .unwrap_or(default)
}
