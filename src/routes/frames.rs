use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::extractors::{JsonBody, SessionId};
use crate::response::AppError;
use crate::state::AppState;
use crate::tracking::{FrameResult, TrackingStatus};
use crate::vision::EyeDirection;

pub fn router() -> Router<AppState> {
    Router::new().route("/process_frame", post(process_frame))
}

#[derive(Debug, Deserialize)]
struct ProcessFrameRequest {
    image: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProcessFrameResponse {
    face_count: usize,
    eye_data: EyeData,
}

#[derive(Debug, Serialize)]
struct EyeData {
    eyes_detected: usize,
    movement_detected: bool,
    movement_magnitude: f64,
    eye_direction: EyeDirection,
    tracking_status: TrackingStatus,
    calibrated: bool,
}

impl From<FrameResult> for ProcessFrameResponse {
    fn from(result: FrameResult) -> Self {
        Self {
            face_count: result.face_count,
            eye_data: EyeData {
                eyes_detected: result.eyes_detected,
                movement_detected: result.movement_detected,
                movement_magnitude: result.movement_magnitude,
                eye_direction: result.eye_direction,
                tracking_status: result.tracking_status,
                calibrated: result.calibrated,
            },
        }
    }
}

async fn process_frame(
    State(state): State<AppState>,
    session: SessionId,
    JsonBody(req): JsonBody<ProcessFrameRequest>,
) -> Result<Json<ProcessFrameResponse>, AppError> {
    let image = req
        .image
        .filter(|payload| !payload.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("MISSING_IMAGE", "No image data received"))?;

    let session = match req.session_id.as_deref() {
        Some(raw) => SessionId::parse(raw)?,
        None => session,
    };

    // Decoding and the cascade search are CPU-bound.
    let result = tokio::task::spawn_blocking(move || {
        state.processor().process(
            state.sessions(),
            state.event_log().as_ref(),
            session.as_str(),
            &image,
        )
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Frame worker task failed");
        AppError::internal(&format!("frame worker failed: {e}"))
    })??;

    Ok(Json(result.into()))
}
