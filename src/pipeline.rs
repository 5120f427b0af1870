//! One frame, end to end: decode, detect, measure, log, commit.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::event_log::{EventLevel, EventLog, EventLogError};
use crate::tracking::{FrameResult, Observation, SessionStore};
use crate::vision::{
    decode_data_url, locate_features, DecodeError, DetectError, FeatureDetector,
    FrameDetections, MovementEstimator,
};

#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    EventLog(#[from] EventLogError),
}

pub struct FrameProcessor {
    detector: Arc<dyn FeatureDetector>,
    estimator: MovementEstimator,
}

impl FrameProcessor {
    pub fn new(detector: Arc<dyn FeatureDetector>, estimator: MovementEstimator) -> Self {
        Self {
            detector,
            estimator,
        }
    }

    pub fn estimator(&self) -> &MovementEstimator {
        &self.estimator
    }

    /// Decodes the data-URL payload and runs the face/eye search on its grayscale.
    pub fn detect(&self, payload: &str) -> Result<FrameDetections, FrameError> {
        let image = decode_data_url(payload)?;
        let gray = image.to_luma8();
        Ok(locate_features(self.detector.as_ref(), &gray)?)
    }

    /// Processes a frame for `session_id`.
    ///
    /// The frame is measured and committed under the session lock, then its
    /// event lines are written. If a line cannot be written the session is
    /// put back as it was, unless a concurrent frame has moved it on.
    /// Failures are also appended to the event log when it is writable.
    pub fn process(
        &self,
        sessions: &SessionStore,
        events: &dyn EventLog,
        session_id: &str,
        payload: &str,
    ) -> Result<FrameResult, FrameError> {
        let outcome = self.process_frame(sessions, events, session_id, payload);
        if let Err(err) = &outcome {
            tracing::error!(session_id, error = %err, "Error processing frame");
            if let Err(log_err) =
                events.append(EventLevel::Error, &format!("Error processing frame: {err}"))
            {
                tracing::warn!(error = %log_err, "Failed to record frame error in event log");
            }
        }
        outcome
    }

    fn process_frame(
        &self,
        sessions: &SessionStore,
        events: &dyn EventLog,
        session_id: &str,
        payload: &str,
    ) -> Result<FrameResult, FrameError> {
        let detections = self.detect(payload)?;
        let now = Utc::now();

        let (observation, before, after) = sessions.with_state(session_id, |state| {
            let before = state.clone();
            let observation = state.observe(&detections, &self.estimator, now);
            (observation, before, state.clone())
        });

        if let Err(err) = record(events, session_id, &observation) {
            if !sessions.restore_if_unchanged(session_id, &after, before) {
                tracing::warn!(
                    session_id,
                    "Session moved on before a failed frame could be undone"
                );
            }
            return Err(err.into());
        }

        Ok(observation.result)
    }
}

fn record(
    events: &dyn EventLog,
    session_id: &str,
    observation: &Observation,
) -> Result<(), EventLogError> {
    let result = &observation.result;
    events.append(
        EventLevel::Info,
        &format!(
            "Detected {} faces and {} eyes in the frame (session {session_id})",
            result.face_count, result.eyes_detected
        ),
    )?;
    tracing::info!(
        session_id,
        faces = result.face_count,
        eyes = result.eyes_detected,
        direction = result.eye_direction.as_str(),
        "frame processed"
    );

    if result.movement_detected {
        events.append(
            EventLevel::Warning,
            &format!(
                "Eye movement detected: {:.2} px, looking {} (session {session_id})",
                result.movement_magnitude,
                result.eye_direction.as_str()
            ),
        )?;
        tracing::warn!(
            session_id,
            magnitude = result.movement_magnitude,
            "eye movement detected"
        );
    }

    if observation.calibrated_now {
        events.append(
            EventLevel::Info,
            &format!(
                "Eye tracking calibrated with {} eyes (session {session_id})",
                result.eyes_detected
            ),
        )?;
    }
    Ok(())
}
