//! Frame-to-frame eye displacement.

use serde::Serialize;

use crate::constants::MOVEMENT_THRESHOLD_PX;
use crate::vision::geometry::BoundingBox;

/// How current eyes are matched against the previous frame's eyes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EyePairing {
    /// i-th current eye against i-th previous eye; extra eyes on either side are ignored.
    Positional,
    /// Each current eye against its spatially nearest previous eye. Pairs further
    /// apart than `max_distance` are treated as an eye appearing, not moving.
    Nearest { max_distance: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Movement {
    pub detected: bool,
    /// Largest paired center displacement, in pixels.
    pub magnitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementEstimator {
    threshold: f64,
    pairing: EyePairing,
}

impl Default for MovementEstimator {
    fn default() -> Self {
        Self::new(MOVEMENT_THRESHOLD_PX, EyePairing::Positional)
    }
}

impl MovementEstimator {
    pub fn new(threshold: f64, pairing: EyePairing) -> Self {
        Self { threshold, pairing }
    }

    pub fn with_pairing(pairing: EyePairing) -> Self {
        Self::new(MOVEMENT_THRESHOLD_PX, pairing)
    }

    pub fn pairing(&self) -> EyePairing {
        self.pairing
    }

    /// Movement is detected iff the magnitude strictly exceeds the threshold.
    pub fn estimate(&self, current: &[BoundingBox], previous: &[BoundingBox]) -> Movement {
        if current.is_empty() || previous.is_empty() {
            return Movement::default();
        }

        let magnitude = match self.pairing {
            EyePairing::Positional => current
                .iter()
                .zip(previous)
                .map(|(now, before)| now.center_distance(before))
                .fold(0.0, f64::max),
            EyePairing::Nearest { max_distance } => current
                .iter()
                .filter_map(|now| {
                    previous
                        .iter()
                        .map(|before| now.center_distance(before))
                        .min_by(f64::total_cmp)
                })
                .filter(|distance| *distance <= max_distance)
                .fold(0.0, f64::max),
        };

        Movement {
            detected: magnitude > self.threshold,
            magnitude,
        }
    }
}
