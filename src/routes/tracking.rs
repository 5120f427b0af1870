use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event_log::EventLevel;
use crate::extractors::SessionId;
use crate::state::AppState;
use crate::vision::EyeSet;

pub const RESET_MESSAGE: &str = "Eye tracking reset successfully";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reset_eye_tracking", post(reset_eye_tracking))
        .route("/tracking_status", get(tracking_status))
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    status: &'static str,
}

async fn reset_eye_tracking(
    State(state): State<AppState>,
    session: SessionId,
) -> Json<ResetResponse> {
    let existed = state.sessions().reset(session.as_str());
    tracing::info!(session_id = %session.as_str(), existed, "Eye tracking reset");

    // The reset already happened; a missing log line must not turn it into an error.
    let event_log = state.event_log().clone();
    let message = format!("Eye tracking reset (session {})", session.as_str());
    let appended =
        tokio::task::spawn_blocking(move || event_log.append(EventLevel::Info, &message)).await;
    match appended {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Failed to record reset in event log"),
        Err(e) => tracing::warn!(error = %e, "Reset log task failed"),
    }

    Json(ResetResponse {
        status: RESET_MESSAGE,
    })
}

#[derive(Debug, Serialize)]
struct TrackingStatusResponse {
    session_id: String,
    calibrated: bool,
    calibrated_at: Option<DateTime<Utc>>,
    baseline: Option<EyeSet>,
    previous: EyeSet,
    last_movement_at: Option<DateTime<Utc>>,
}

async fn tracking_status(
    State(state): State<AppState>,
    session: SessionId,
) -> Json<TrackingStatusResponse> {
    let snapshot = state.sessions().snapshot(session.as_str());
    Json(TrackingStatusResponse {
        calibrated: snapshot.is_calibrated(),
        calibrated_at: snapshot.calibrated_at(),
        baseline: snapshot.baseline().map(<[_]>::to_vec),
        previous: snapshot.previous().to_vec(),
        last_movement_at: snapshot.last_movement_at(),
        session_id: session.0,
    })
}
