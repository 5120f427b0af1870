//! Coarse left/center/right classification of the eye cluster within a face.
//!
//! No head-pose compensation and no calibration: the mean eye center is
//! compared with the face center, normalized by face width.

use serde::{Deserialize, Serialize};

use crate::constants::GAZE_CENTER_BAND;
use crate::vision::geometry::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeDirection {
    Left,
    Center,
    Right,
    Unknown,
}

impl EyeDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            EyeDirection::Left => "left",
            EyeDirection::Center => "center",
            EyeDirection::Right => "right",
            EyeDirection::Unknown => "unknown",
        }
    }
}

/// Signed offset of the mean eye center from the face center, in face widths.
///
/// `None` with fewer than two eyes or a zero-width face.
pub fn horizontal_offset_ratio(eyes: &[BoundingBox], face: &BoundingBox) -> Option<f64> {
    if eyes.len() < 2 || face.width == 0 {
        return None;
    }
    let mean_x = eyes.iter().map(BoundingBox::center_x).sum::<f64>() / eyes.len() as f64;
    Some((mean_x - face.center_x()) / f64::from(face.width))
}

pub fn estimate_direction(eyes: &[BoundingBox], face: &BoundingBox) -> EyeDirection {
    match horizontal_offset_ratio(eyes, face) {
        None => EyeDirection::Unknown,
        Some(r) if r < -GAZE_CENTER_BAND => EyeDirection::Left,
        Some(r) if r > GAZE_CENTER_BAND => EyeDirection::Right,
        Some(_) => EyeDirection::Center,
    }
}
