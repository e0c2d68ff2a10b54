use super::AppState;
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Last applied log, absent before the first event.
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
    pub events_recorded: i64,
}

pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let cursor = state.repo.get_cursor().await?;
    let events_recorded = state.repo.count_events().await?;

    Ok(Json(StatusResponse {
        block_number: cursor.map(|c| c.block_number),
        log_index: cursor.map(|c| c.log_index),
        events_recorded,
    }))
}
