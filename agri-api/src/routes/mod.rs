//! API route handlers

pub mod health;
pub mod ingest;
pub mod metrics;
pub mod records;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::error::ApiError;
use crate::state::AppState;
use crate::ws;

/// Total request size cap
const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Ingest
        .route("/api/v1/ingest", post(ingest::ingest_packet))
        // Metrics
        .route("/api/v1/metrics/overview", get(metrics::metrics_overview))
        // Record lookups
        .route("/api/v1/devices/:device_id/latest", get(records::latest_by_device))
        .route("/api/v1/batches/:batch_code/trace", get(records::batch_trace))
        .route("/api/v1/transactions/:tx_hash", get(records::by_transaction))
        // Streams
        .route("/ws/telemetry", get(ws::telemetry_stream))
        .route("/ws/alerts", get(ws::alerts_stream))
        // Everything else
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("route not found".to_owned())
}
