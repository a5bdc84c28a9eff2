//! Health check endpoint

use axum::Json;

use crate::dto::HealthResponse;

/// Liveness probe
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
