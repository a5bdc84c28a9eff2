//! Ingest endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use agri_core::codec::parse_packet;

use crate::dto::{ingest_result_to_response, ErrorBody};
use crate::state::AppState;

/// `POST /api/v1/ingest`
///
/// Decode failures answer 400 without touching the ingest service. The
/// service itself never fails: its outcome maps to 202 (accepted) or 400
/// (rejected), and either way the outcome is fanned out to the relevant
/// stream subscribers.
pub async fn ingest_packet(State(state): State<AppState>, body: String) -> Response {
    let packet = match parse_packet(&body) {
        Ok(packet) => packet,
        Err(error) => {
            let body = ErrorBody {
                error: error.to_string(),
            };
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    let result = state.ingest.ingest(&packet).await;
    state.broadcaster.publish_ingest_outcome(&packet, &result);

    let status = if result.accepted {
        StatusCode::ACCEPTED
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(ingest_result_to_response(&result))).into_response()
}
