//! Detector and preprocessor capability seams
//!
//! The real model runs behind the [`Detector`] trait; the deterministic
//! variants here stand in for it in tests, offline runs and the CLI.

use anyhow::Context;
use image::RgbImage;
use pillcheck_core::{BBox, Detection};
use std::path::Path;
use thiserror::Error;

/// Failures of the external detector capability.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// No model is loaded or the backend is unreachable.
    #[error("detector unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the frame.
    #[error("inference failed: {0}")]
    Inference(String),
}

/// External object-detector capability.
///
/// Implementations are constructed once at startup and shared read-only;
/// a verification call must not mutate model state.
pub trait Detector: Send + Sync {
    /// Propose candidate pill sightings for one frame.
    ///
    /// `confidence_floor` and `iou_floor` are the loose thresholds the
    /// backend applies internally; the decision core filters harder.
    fn detect(
        &self,
        image: &RgbImage,
        confidence_floor: f32,
        iou_floor: f32,
    ) -> Result<Vec<Detection>, DetectorError>;
}

/// Image-enhancement capability applied before detection.
pub trait Preprocessor: Send + Sync {
    fn enhance(&self, image: RgbImage) -> RgbImage;
}

/// Pass-through preprocessor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPreprocessor;

impl Preprocessor for NoopPreprocessor {
    fn enhance(&self, image: RgbImage) -> RgbImage {
        image
    }
}

/// Deterministic detector returning a fixed detection set.
///
/// Selected by configuration when fast, reproducible answers are needed
/// instead of the real model; the pipeline itself never branches on it.
#[derive(Debug, Clone, Default)]
pub struct MockDetector {
    detections: Vec<Detection>,
}

impl MockDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Single well-formed sighting of the given pill, handy for smoke
    /// tests and dry runs.
    pub fn single_pill(label: &str) -> Self {
        Self::new(vec![Detection::new(
            label,
            0.9,
            BBox::new(40.0, 40.0, 80.0, 80.0),
        )])
    }
}

impl Detector for MockDetector {
    fn detect(
        &self,
        _image: &RgbImage,
        confidence_floor: f32,
        _iou_floor: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= confidence_floor)
            .cloned()
            .collect())
    }
}

/// Detector backed by a JSON fixture of precomputed detections.
#[derive(Debug, Clone)]
pub struct StaticDetector {
    detections: Vec<Detection>,
}

impl StaticDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Load a detection fixture (a JSON array of detections).
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read detections: {:?}", path.as_ref()))?;
        let detections: Vec<Detection> =
            serde_json::from_str(&raw).context("Failed to parse detections JSON")?;

        Ok(Self { detections })
    }
}

impl Detector for StaticDetector {
    fn detect(
        &self,
        _image: &RgbImage,
        confidence_floor: f32,
        _iou_floor: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= confidence_floor)
            .cloned()
            .collect())
    }
}

/// Detector with no model behind it; every call fails.
///
/// Used where the model file was missing at startup, so verification
/// degrades to a failing verdict instead of crashing.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDetector;

impl Detector for UnavailableDetector {
    fn detect(
        &self,
        _image: &RgbImage,
        _confidence_floor: f32,
        _iou_floor: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        Err(DetectorError::Unavailable("no model loaded".into()))
    }
}
