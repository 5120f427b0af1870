use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::constants::LOG_TAIL_LINES;
use crate::response::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/get_logs", get(get_logs))
}

#[derive(Debug, Serialize)]
struct LogsResponse {
    logs: Vec<String>,
}

/// Most recent event log lines, oldest first.
async fn get_logs(State(state): State<AppState>) -> Result<Json<LogsResponse>, AppError> {
    let event_log = state.event_log().clone();
    let logs = tokio::task::spawn_blocking(move || event_log.tail(LOG_TAIL_LINES))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Log reader task failed");
            AppError::internal(&format!("log reader failed: {e}"))
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read event log");
            AppError::from(e)
        })?;
    Ok(Json(LogsResponse { logs }))
}
