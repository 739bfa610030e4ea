//! Quality filtering of raw detector output

use crate::bbox::Detection;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Thresholds applied to raw detections before deduplication.
///
/// The floor handed to the detector itself is intentionally looser than
/// these; this stage is the real precision gate and is tuned
/// independently of whatever threshold the model used upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    pub min_confidence: f32,
    /// Minimum box area in square pixels.
    pub min_area: f32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.45,
            min_area: 100.0,
            min_aspect_ratio: 0.33,
            max_aspect_ratio: 3.0,
        }
    }
}

impl QualityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::OutOfRange {
                name: "min_confidence",
                value: self.min_confidence,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.min_area < 0.0 {
            return Err(ConfigError::Negative {
                name: "min_area",
                value: self.min_area,
            });
        }
        if self.min_aspect_ratio < 0.0 {
            return Err(ConfigError::Negative {
                name: "min_aspect_ratio",
                value: self.min_aspect_ratio,
            });
        }
        if self.min_aspect_ratio > self.max_aspect_ratio {
            return Err(ConfigError::InvertedAspectBounds {
                min: self.min_aspect_ratio,
                max: self.max_aspect_ratio,
            });
        }
        Ok(())
    }

    /// Whether a single detection clears every quality predicate.
    ///
    /// The predicates are independent; evaluation order does not affect
    /// the outcome.
    pub fn accepts(&self, detection: &Detection) -> bool {
        let aspect = detection.aspect_ratio();
        detection.confidence >= self.min_confidence
            && detection.area() >= self.min_area
            && aspect >= self.min_aspect_ratio
            && aspect <= self.max_aspect_ratio
    }

    /// Filter a raw detection list, preserving input order.
    pub fn apply(&self, detections: Vec<Detection>) -> Vec<Detection> {
        let before = detections.len();
        let kept: Vec<Detection> = detections.into_iter().filter(|d| self.accepts(d)).collect();
        log::debug!("quality filter kept {}/{} detections", kept.len(), before);
        kept
    }
}
