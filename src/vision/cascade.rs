//! Haar cascade backend (OpenCV `CascadeClassifier`).

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use image::GrayImage;
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use crate::config::DetectorConfig;
use crate::vision::detector::{DetectError, Feature, FeatureDetector};
use crate::vision::geometry::BoundingBox;

impl From<opencv::Error> for DetectError {
    fn from(value: opencv::Error) -> Self {
        DetectError::Backend(value.to_string())
    }
}

/// Frontal-face and eye cascades. `detect_multi_scale` needs `&mut self`,
/// so each classifier sits behind its own mutex.
pub struct CascadeDetector {
    face: Mutex<CascadeClassifier>,
    eye: Mutex<CascadeClassifier>,
}

impl CascadeDetector {
    pub fn load(config: &DetectorConfig) -> Result<Self, DetectError> {
        let face = load_classifier(&config.face_cascade_path)?;
        let eye = load_classifier(&config.eye_cascade_path)?;
        tracing::info!(
            face = %config.face_cascade_path,
            eye = %config.eye_cascade_path,
            "Cascade classifiers loaded"
        );
        Ok(Self {
            face: Mutex::new(face),
            eye: Mutex::new(eye),
        })
    }
}

fn load_classifier(path: &str) -> Result<CascadeClassifier, DetectError> {
    if !Path::new(path).is_file() {
        return Err(DetectError::Model(format!("cascade file not found: {path}")));
    }
    let classifier = CascadeClassifier::new(path)
        .map_err(|e| DetectError::Model(format!("failed to load {path}: {e}")))?;
    if classifier.empty()? {
        return Err(DetectError::Model(format!("cascade is empty: {path}")));
    }
    Ok(classifier)
}

impl FeatureDetector for CascadeDetector {
    fn detect(&self, feature: Feature, image: &GrayImage) -> Result<Vec<BoundingBox>, DetectError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let mat = Mat::from_slice_rows_cols(image.as_raw(), height as usize, width as usize)?;
        let params = feature.params();
        let min_size = i32::try_from(params.min_size).unwrap_or(i32::MAX);
        let mut hits = Vector::<Rect>::new();

        let slot = match feature {
            Feature::Face => &self.face,
            Feature::Eye => &self.eye,
        };
        let mut classifier = slot.lock().unwrap_or_else(PoisonError::into_inner);
        classifier.detect_multi_scale(
            &*mat,
            &mut hits,
            params.scale_factor,
            params.min_neighbors,
            0,
            Size::new(min_size, min_size),
            Size::default(),
        )?;

        tracing::trace!(feature = feature.as_str(), hits = hits.len(), "cascade search");
        Ok(hits.iter().filter_map(rect_to_box).collect())
    }
}

fn rect_to_box(rect: Rect) -> Option<BoundingBox> {
    Some(BoundingBox::new(
        u32::try_from(rect.x).ok()?,
        u32::try_from(rect.y).ok()?,
        u32::try_from(rect.width).ok()?,
        u32::try_from(rect.height).ok()?,
    ))
}
