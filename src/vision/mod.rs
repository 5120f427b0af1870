//! Frame decoding, feature detection, and the per-frame eye heuristics.

#[cfg(feature = "opencv")]
pub mod cascade;
pub mod decode;
pub mod detector;
pub mod gaze;
pub mod geometry;
pub mod movement;

pub use decode::{decode_data_url, DecodeError};
pub use detector::{
    locate_features, DetectError, Feature, FeatureDetector, FrameDetections, Scene,
    ScriptedDetector,
};
pub use gaze::{estimate_direction, EyeDirection};
pub use geometry::{BoundingBox, EyeSet};
pub use movement::{EyePairing, Movement, MovementEstimator};
