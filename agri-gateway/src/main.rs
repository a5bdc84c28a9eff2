//! agri-gateway - telemetry ingestion gateway
//!
//! Composition root: wires the repository, signature verifier, anchoring
//! client, ingest service, and HTTP/WS server together from environment
//! configuration, then serves until SIGINT/SIGTERM.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use agri_api::{run_server, ApiConfig, AppState};
use agri_chain::{BlockchainClient, EthereumRpcClient, EthereumRpcConfig, MockBlockchainClient};
use agri_core::crypto::{load_public_keys, BasicSignatureVerifier, VerifierMode};
use agri_db::{SqliteTelemetryRepository, TelemetryRepository};
use agri_ingest::IngestService;

mod config;

use config::{ChainMode, GatewayConfig};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => {
            info!("gateway stopped");
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(error = %error, "fatal gateway error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = GatewayConfig::from_env();

    let repository: Arc<dyn TelemetryRepository> =
        Arc::new(SqliteTelemetryRepository::open(&config.sqlite_path)?);

    let public_keys = load_public_keys(&config.public_keys_dir);
    info!(
        count = public_keys.len(),
        dir = %config.public_keys_dir.display(),
        "loaded public keys"
    );
    if public_keys.is_empty() && config.signature_mode == VerifierMode::Ecdsa {
        warn!("no public keys loaded; every ECDSA verification will fail");
    }
    let verifier = Arc::new(BasicSignatureVerifier::with_mode(
        public_keys,
        config.signature_mode,
    ));

    let blockchain: Arc<dyn BlockchainClient> = match config.chain_mode {
        ChainMode::Ethereum => {
            info!("chain mode: ethereum");
            Arc::new(EthereumRpcClient::new(EthereumRpcConfig::from_env())?)
        }
        ChainMode::Mock => {
            info!("chain mode: mock");
            Arc::new(MockBlockchainClient::new())
        }
    };

    let ingest = Arc::new(IngestService::new(
        repository.clone(),
        verifier,
        blockchain,
    ));
    let state = AppState::new(ingest, repository);

    let api_config = ApiConfig {
        port: config.http_port,
        ..ApiConfig::default()
    };

    run_server(&api_config, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
