//! Agri Chain - Digest Anchoring Clients
//!
//! Submits packet digests to a blockchain and returns the anchoring
//! receipt. Two backends implement the [`BlockchainClient`] capability:
//! a deterministic mock for development and tests, and an Ethereum
//! JSON-RPC client for real deployments. Submission is synchronous from
//! the caller's point of view: the client either returns a receipt or a
//! descriptive error, with bounded internal retry and polling.

pub mod client;
pub mod config;
pub mod error;
pub mod ethereum;
pub mod mock;

pub use client::BlockchainClient;
pub use config::EthereumRpcConfig;
pub use error::{ChainError, ChainResult};
pub use ethereum::EthereumRpcClient;
pub use mock::MockBlockchainClient;
