//! Metrics endpoint

use axum::extract::State;
use axum::Json;

use crate::dto::{metrics_to_response, MetricsResponse};
use crate::state::AppState;

/// `GET /api/v1/metrics/overview`
pub async fn metrics_overview(State(state): State<AppState>) -> Json<MetricsResponse> {
    let snapshot = state.ingest.metrics_snapshot();
    Json(metrics_to_response(&snapshot))
}
