//! Detector capability and the face → eye search built on top of it.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use image::{imageops, GrayImage};
use thiserror::Error;

use crate::constants::{
    DETECT_MIN_NEIGHBORS, DETECT_SCALE_FACTOR, EYE_MIN_SIZE_PX, FACE_MIN_SIZE_PX,
};
use crate::vision::geometry::{BoundingBox, EyeSet};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("detector model unavailable: {0}")]
    Model(String),
    #[error("detector backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Face,
    Eye,
}

/// Fixed multi-scale search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub min_size: u32,
}

impl Feature {
    pub fn params(self) -> DetectParams {
        let min_size = match self {
            Feature::Face => FACE_MIN_SIZE_PX,
            Feature::Eye => EYE_MIN_SIZE_PX,
        };
        DetectParams {
            scale_factor: DETECT_SCALE_FACTOR,
            min_neighbors: DETECT_MIN_NEIGHBORS,
            min_size,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Face => "face",
            Feature::Eye => "eye",
        }
    }
}

/// Returns boxes relative to the top-left of `image`.
pub trait FeatureDetector: Send + Sync {
    fn detect(&self, feature: Feature, image: &GrayImage) -> Result<Vec<BoundingBox>, DetectError>;
}

/// Faces and the flattened eye set of one frame, all in frame coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameDetections {
    pub faces: Vec<BoundingBox>,
    pub eyes: EyeSet,
}

impl FrameDetections {
    pub fn primary_face(&self) -> Option<&BoundingBox> {
        self.faces.first()
    }
}

/// Detects faces, then eyes inside the upper half of each face.
pub fn locate_features(
    detector: &dyn FeatureDetector,
    gray: &GrayImage,
) -> Result<FrameDetections, DetectError> {
    let faces = detector.detect(Feature::Face, gray)?;
    let mut eyes = Vec::new();

    for face in &faces {
        let region = face.upper_half();
        if region.width == 0 || region.height == 0 {
            continue;
        }
        let roi =
            imageops::crop_imm(gray, region.x, region.y, region.width, region.height).to_image();
        let found = detector.detect(Feature::Eye, &roi)?;
        eyes.extend(found.iter().map(|eye| eye.translated_by(&region)));
    }

    tracing::debug!(faces = faces.len(), eyes = eyes.len(), "features located");
    Ok(FrameDetections { faces, eyes })
}

/// One frame worth of canned detector output.
///
/// `eyes[i]` is what the eye search returns for the i-th face, relative to
/// that face's upper-half region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub faces: Vec<BoundingBox>,
    pub eyes: Vec<Vec<BoundingBox>>,
    pub fail: bool,
}

impl Scene {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single_face(face: BoundingBox, eyes: Vec<BoundingBox>) -> Self {
        Self {
            faces: vec![face],
            eyes: vec![eyes],
            fail: false,
        }
    }

    pub fn failure() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    pending: VecDeque<Scene>,
    current: Scene,
    eye_cursor: usize,
}

/// Deterministic detector that replays queued scenes, one per frame.
///
/// Each face search advances to the next queued scene; once the queue is
/// drained the last scene repeats. Used in place of the cascade backend for
/// tests and fixture runs.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    script: Mutex<Script>,
}

impl ScriptedDetector {
    pub fn new(scenes: impl IntoIterator<Item = Scene>) -> Self {
        Self {
            script: Mutex::new(Script {
                pending: scenes.into_iter().collect(),
                ..Script::default()
            }),
        }
    }

    pub fn push(&self, scene: Scene) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .push_back(scene);
    }
}

impl FeatureDetector for ScriptedDetector {
    fn detect(&self, feature: Feature, _image: &GrayImage) -> Result<Vec<BoundingBox>, DetectError> {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        match feature {
            Feature::Face => {
                if let Some(next) = script.pending.pop_front() {
                    script.current = next;
                }
                script.eye_cursor = 0;
                if script.current.fail {
                    return Err(DetectError::Backend("scripted failure".to_string()));
                }
                Ok(script.current.faces.clone())
            }
            Feature::Eye => {
                let idx = script.eye_cursor;
                script.eye_cursor += 1;
                Ok(script.current.eyes.get(idx).cloned().unwrap_or_default())
            }
        }
    }
}
