//! Per-session eye tracking: calibration state machine and frame evaluation.

pub mod sessions;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::PREVIOUS_EYES_LIMIT;
use crate::vision::{
    estimate_direction, BoundingBox, EyeDirection, EyeSet, FrameDetections, MovementEstimator,
};

pub use sessions::{session_sweep_loop, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Calibration {
    Uncalibrated,
    /// Baseline captured on the first frame with two or more eyes; fixed until reset.
    Calibrated {
        baseline: EyeSet,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingState {
    previous: EyeSet,
    calibration: Calibration,
    last_movement_at: Option<DateTime<Utc>>,
}

impl Default for TrackingState {
    fn default() -> Self {
        Self {
            previous: Vec::new(),
            calibration: Calibration::Uncalibrated,
            last_movement_at: None,
        }
    }
}

/// Outcome of one frame, as reported to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameResult {
    pub face_count: usize,
    pub eyes_detected: usize,
    pub movement_detected: bool,
    pub movement_magnitude: f64,
    pub eye_direction: EyeDirection,
    pub tracking_status: TrackingStatus,
    pub calibrated: bool,
}

/// A frame measured and recorded against a session in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub result: FrameResult,
    /// Set only for the frame that moved the session out of `Uncalibrated`.
    pub calibrated_now: bool,
}

impl FrameResult {
    /// Result for a frame with no face: nothing measured, state untouched.
    pub fn without_faces(calibrated: bool) -> Self {
        Self {
            face_count: 0,
            eyes_detected: 0,
            movement_detected: false,
            movement_magnitude: 0.0,
            eye_direction: EyeDirection::Unknown,
            tracking_status: TrackingStatus::Inactive,
            calibrated,
        }
    }
}

impl TrackingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> &[BoundingBox] {
        &self.previous
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.calibration, Calibration::Calibrated { .. })
    }

    pub fn baseline(&self) -> Option<&[BoundingBox]> {
        match &self.calibration {
            Calibration::Calibrated { baseline, .. } => Some(baseline),
            Calibration::Uncalibrated => None,
        }
    }

    pub fn calibrated_at(&self) -> Option<DateTime<Utc>> {
        match &self.calibration {
            Calibration::Calibrated { at, .. } => Some(*at),
            Calibration::Uncalibrated => None,
        }
    }

    pub fn last_movement_at(&self) -> Option<DateTime<Utc>> {
        self.last_movement_at
    }

    /// Measures a frame against this state without changing it.
    pub fn evaluate(&self, frame: &FrameDetections, estimator: &MovementEstimator) -> FrameResult {
        let Some(face) = frame.primary_face() else {
            return FrameResult::without_faces(self.is_calibrated());
        };

        let eyes = &frame.eyes;
        let movement = estimator.estimate(eyes, &self.previous);

        FrameResult {
            face_count: frame.faces.len(),
            eyes_detected: eyes.len(),
            movement_detected: movement.detected,
            movement_magnitude: movement.magnitude,
            eye_direction: estimate_direction(eyes, face),
            tracking_status: if eyes.is_empty() {
                TrackingStatus::Inactive
            } else {
                TrackingStatus::Active
            },
            calibrated: self.is_calibrated() || eyes.len() >= 2,
        }
    }

    /// Evaluates `frame` and commits it when it contains a face.
    ///
    /// Run under the session lock so that exactly one frame observes the
    /// calibration transition.
    pub fn observe(
        &mut self,
        frame: &FrameDetections,
        estimator: &MovementEstimator,
        now: DateTime<Utc>,
    ) -> Observation {
        let result = self.evaluate(frame, estimator);
        let calibrated_now = result.face_count > 0
            && self.commit(&frame.eyes, result.movement_detected, now);
        Observation {
            result,
            calibrated_now,
        }
    }

    /// Records a frame's eyes. Frames without eyes leave the state untouched.
    ///
    /// Returns `true` when this frame calibrated the session.
    pub fn commit(
        &mut self,
        eyes: &[BoundingBox],
        movement_detected: bool,
        now: DateTime<Utc>,
    ) -> bool {
        if eyes.is_empty() {
            return false;
        }

        let keep_from = eyes.len().saturating_sub(PREVIOUS_EYES_LIMIT);
        self.previous = eyes[keep_from..].to_vec();

        if movement_detected {
            self.last_movement_at = Some(now);
        }

        if !self.is_calibrated() && eyes.len() >= 2 {
            self.calibration = Calibration::Calibrated {
                baseline: eyes.to_vec(),
                at: now,
            };
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
