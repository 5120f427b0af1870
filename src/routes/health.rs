use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "sessions": state.sessions().len(),
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Ready while the event log accepts writes.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let event_log = state.event_log().clone();
    match tokio::task::spawn_blocking(move || event_log.check()).await {
        Ok(Ok(())) => StatusCode::OK,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(e) => {
            tracing::error!(error = %e, "Readiness check task failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
