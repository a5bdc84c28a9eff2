//! Record lookup endpoints

use axum::extract::{Path, State};
use axum::Json;

use crate::dto::{record_to_response, BatchTraceResponse, RecordResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /api/v1/devices/{id}/latest`
pub async fn latest_by_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> ApiResult<Json<RecordResponse>> {
    let record = state
        .repository
        .latest_by_device(&device_id)
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::NotFound("device not found".to_owned()))?;

    Ok(Json(record_to_response(&record)?))
}

/// `GET /api/v1/batches/{code}/trace`
pub async fn batch_trace(
    State(state): State<AppState>,
    Path(batch_code): Path<String>,
) -> ApiResult<Json<BatchTraceResponse>> {
    let records = state
        .repository
        .find_by_batch(&batch_code)
        .map_err(ApiError::from_store)?;

    let records = records
        .iter()
        .map(record_to_response)
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(BatchTraceResponse {
        batch_code,
        count: records.len(),
        records,
    }))
}

/// `GET /api/v1/transactions/{txHash}`
pub async fn by_transaction(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> ApiResult<Json<RecordResponse>> {
    let record = state
        .repository
        .find_by_transaction(&tx_hash)
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::NotFound("transaction not found".to_owned()))?;

    Ok(Json(record_to_response(&record)?))
}
