//! Independent classifier cross-check over surviving detections
//!
//! A secondary, optional signal: each survivor's cropped region is
//! re-classified by a feature-based model, and the verdict can be
//! tightened on disagreement. With no classifier configured the
//! primary verdict stands untouched.

pub mod classifier;
pub mod features;
pub mod scaler;

pub use classifier::{Centroid, Classifier, NearestCentroid, Prediction};
pub use features::FeatureExtractor;
pub use scaler::StandardScaler;

use crate::roi::{self, Roi};
use image::RgbImage;
use pillcheck_core::{Detection, Expectation, MismatchReason, Verdict};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Failures local to the cross-check. Each is contained to a single
/// per-detection outcome and never aborts the primary verdict.
#[derive(Debug, Error)]
pub enum CrossCheckError {
    #[error("feature vector length mismatch: expected {expected}, got {got}")]
    FeatureLength { expected: usize, got: usize },

    #[error("classifier model has no centroids")]
    EmptyModel,
}

/// Cross-check tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossCheckConfig {
    /// Pixel padding around each box before cropping.
    pub padding: u32,
    /// Side length of the square grayscale patch in the feature vector.
    pub patch_size: u32,
    /// Confidence multiplier applied on low detector/classifier
    /// agreement.
    pub damping_factor: f32,
    /// Agreement rate below which the confidence is damped.
    pub min_agreement: f32,
}

impl Default for CrossCheckConfig {
    fn default() -> Self {
        Self {
            padding: 4,
            patch_size: 8,
            damping_factor: 0.7,
            min_agreement: 0.5,
        }
    }
}

/// How one detection fared in the cross-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossCheckStatus {
    /// Classifier agreed with the detector's label.
    Match,
    /// Classifier predicted a different label.
    Mismatch,
    /// Region was empty after clamping; no guess made.
    Skipped,
    /// Feature extraction or prediction failed.
    Failed,
}

/// Per-detection cross-check record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossCheckResult {
    pub detector_label: String,
    pub predicted_label: Option<String>,
    pub predicted_confidence: Option<f32>,
    pub status: CrossCheckStatus,
}

/// Aggregate cross-check evidence attached to the response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossCheckSummary {
    pub enabled: bool,
    pub attempted: usize,
    pub successful: usize,
    /// Agreement rate between detector and classifier labels.
    #[serde(rename = "yoloKnnMatchRate")]
    pub detector_match_rate: f32,
    /// Rate at which the classifier confirmed the expected label.
    pub expected_match_rate: f32,
    pub foreign_pills_detected: bool,
    pub foreign_pills: Vec<String>,
    pub results: Vec<CrossCheckResult>,
}

impl CrossCheckSummary {
    /// Summary for a run without a configured classifier.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            attempted: 0,
            successful: 0,
            detector_match_rate: 0.0,
            expected_match_rate: 0.0,
            foreign_pills_detected: false,
            foreign_pills: Vec::new(),
            results: Vec::new(),
        }
    }
}

/// Runs the secondary classifier over each surviving detection and can
/// tighten the primary verdict.
pub struct CrossChecker {
    config: CrossCheckConfig,
    extractor: FeatureExtractor,
    scaler: Option<StandardScaler>,
    classifier: Box<dyn Classifier>,
}

impl CrossChecker {
    pub fn new(
        config: CrossCheckConfig,
        classifier: Box<dyn Classifier>,
        scaler: Option<StandardScaler>,
    ) -> Self {
        let extractor = FeatureExtractor::new(config.patch_size);
        Self {
            config,
            extractor,
            scaler,
            classifier,
        }
    }

    /// Classify one detection's region.
    fn check_one(&self, image: &RgbImage, detection: &Detection) -> CrossCheckResult {
        let skipped = |status| CrossCheckResult {
            detector_label: detection.label.clone(),
            predicted_label: None,
            predicted_confidence: None,
            status,
        };

        let region = match roi::crop_padded(image, &detection.bbox, self.config.padding) {
            Roi::Region(region) => region,
            Roi::Degenerate => return skipped(CrossCheckStatus::Skipped),
        };

        let mut features = self.extractor.extract(&region);
        if let Some(scaler) = &self.scaler {
            if let Err(e) = scaler.transform(&mut features) {
                log::warn!("cross-check scaling failed for '{}': {e}", detection.label);
                return skipped(CrossCheckStatus::Failed);
            }
        }

        match self.classifier.predict(&features) {
            Ok(prediction) => {
                let agrees = prediction
                    .label
                    .trim()
                    .eq_ignore_ascii_case(detection.label.trim());
                CrossCheckResult {
                    detector_label: detection.label.clone(),
                    predicted_label: Some(prediction.label),
                    predicted_confidence: prediction.confidence,
                    status: if agrees {
                        CrossCheckStatus::Match
                    } else {
                        CrossCheckStatus::Mismatch
                    },
                }
            }
            Err(e) => {
                log::warn!("cross-check prediction failed for '{}': {e}", detection.label);
                skipped(CrossCheckStatus::Failed)
            }
        }
    }

    /// Run the cross-check and refine the verdict.
    ///
    /// A classifier verdict of a foreign pill type outranks the
    /// detector: any cross-check disagreement with the expected label
    /// fails the container. Low detector/classifier agreement only
    /// damps the confidence, never flips the pass flag.
    pub fn refine(
        &self,
        image: &RgbImage,
        survivors: &[Detection],
        expectation: &Expectation,
        mut verdict: Verdict,
    ) -> (Verdict, CrossCheckSummary) {
        #[cfg(feature = "parallel")]
        let results: Vec<CrossCheckResult> = survivors
            .par_iter()
            .map(|d| self.check_one(image, d))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let results: Vec<CrossCheckResult> = survivors
            .iter()
            .map(|d| self.check_one(image, d))
            .collect();

        let attempted = results.len();
        let successful = results
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    CrossCheckStatus::Match | CrossCheckStatus::Mismatch
                )
            })
            .count();
        let matches = results
            .iter()
            .filter(|r| r.status == CrossCheckStatus::Match)
            .count();
        let detector_match_rate = if successful == 0 {
            0.0
        } else {
            matches as f32 / successful as f32
        };

        let expected = expectation.normalized_label();
        let (expected_match_rate, foreign_pills) = match &expected {
            Some(label) => {
                let confirmed = results
                    .iter()
                    .filter(|r| {
                        r.predicted_label
                            .as_deref()
                            .is_some_and(|p| p.trim().to_lowercase() == *label)
                    })
                    .count();
                let foreign: Vec<String> = results
                    .iter()
                    .filter_map(|r| r.predicted_label.clone())
                    .filter(|p| p.trim().to_lowercase() != *label)
                    .collect();
                let rate = if successful == 0 {
                    0.0
                } else {
                    confirmed as f32 / successful as f32
                };
                (rate, foreign)
            }
            None => (0.0, Vec::new()),
        };
        let foreign_pills_detected = !foreign_pills.is_empty();

        if expected.is_some() && foreign_pills_detected {
            verdict.pass = false;
            verdict.mismatch_reason = MismatchReason::ForeignType;
            log::debug!(
                "cross-check overrode verdict: {} foreign prediction(s)",
                foreign_pills.len()
            );
        } else if successful > 0 && detector_match_rate < self.config.min_agreement {
            verdict.confidence *= self.config.damping_factor;
            log::debug!(
                "cross-check damped confidence to {:.3} (agreement {:.2})",
                verdict.confidence,
                detector_match_rate
            );
        }

        let summary = CrossCheckSummary {
            enabled: true,
            attempted,
            successful,
            detector_match_rate,
            expected_match_rate,
            foreign_pills_detected,
            foreign_pills,
            results,
        };

        (verdict, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pillcheck_core::{BBox, VerdictPolicy, decide};

    /// Region-color model: bright regions are aspirin, dark are
    /// ibuprofen (first feature is the red-channel mean).
    fn checker() -> CrossChecker {
        let extractor_len = FeatureExtractor::new(8).feature_len();
        let bright = vec![1.0; extractor_len];
        let dark = vec![0.0; extractor_len];

        let model = NearestCentroid::new(vec![
            Centroid {
                label: "aspirin".into(),
                values: bright,
            },
            Centroid {
                label: "ibuprofen".into(),
                values: dark,
            },
        ]);
        CrossChecker::new(CrossCheckConfig::default(), Box::new(model), None)
    }

    fn white_image() -> RgbImage {
        RgbImage::from_pixel(100, 100, image::Rgb([255, 255, 255]))
    }

    fn survivor(label: &str) -> Detection {
        Detection::new(label, 0.9, BBox::new(20.0, 20.0, 60.0, 60.0))
    }

    #[test]
    fn test_agreement_leaves_verdict_unchanged() {
        let survivors = vec![survivor("aspirin")];
        let expectation = Expectation::of_label("aspirin").with_count(1);
        let verdict = decide(&survivors, &expectation, &VerdictPolicy::default());

        let (refined, summary) =
            checker().refine(&white_image(), &survivors, &expectation, verdict.clone());

        assert_eq!(refined, verdict);
        assert!(summary.enabled);
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.detector_match_rate, 1.0);
        assert!(!summary.foreign_pills_detected);
    }

    #[test]
    fn test_foreign_prediction_overrides_pass() {
        // Detector said aspirin everywhere, but the regions look dark:
        // the classifier calls them ibuprofen.
        let dark_image = RgbImage::from_pixel(100, 100, image::Rgb([0, 0, 0]));
        let survivors = vec![survivor("aspirin")];
        let expectation = Expectation::of_label("aspirin").with_count(1);
        let verdict = decide(&survivors, &expectation, &VerdictPolicy::default());
        assert!(verdict.pass);

        let (refined, summary) =
            checker().refine(&dark_image, &survivors, &expectation, verdict);

        assert!(!refined.pass);
        assert_eq!(refined.mismatch_reason, MismatchReason::ForeignType);
        assert!(summary.foreign_pills_detected);
        assert_eq!(summary.foreign_pills, vec!["ibuprofen".to_string()]);
    }

    #[test]
    fn test_low_agreement_damps_confidence_without_flipping() {
        // No expected label: disagreement can only damp, never fail.
        let dark_image = RgbImage::from_pixel(100, 100, image::Rgb([0, 0, 0]));
        let survivors = vec![survivor("aspirin")];
        let expectation = Expectation::any();
        let verdict = decide(&survivors, &expectation, &VerdictPolicy::default());
        assert!(verdict.pass);

        let (refined, summary) =
            checker().refine(&dark_image, &survivors, &expectation, verdict.clone());

        assert!(refined.pass);
        assert_eq!(summary.detector_match_rate, 0.0);
        assert!((refined.confidence - verdict.confidence * 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_region_is_skipped() {
        let survivors = vec![Detection::new(
            "aspirin",
            0.9,
            BBox::new(500.0, 500.0, 600.0, 600.0),
        )];
        let expectation = Expectation::of_label("aspirin").with_count(1);
        let verdict = decide(&survivors, &expectation, &VerdictPolicy::default());

        let (refined, summary) =
            checker().refine(&white_image(), &survivors, &expectation, verdict.clone());

        // A skip is not evidence; the verdict stands.
        assert_eq!(refined, verdict);
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.successful, 0);
        assert_eq!(summary.results[0].status, CrossCheckStatus::Skipped);
    }
}
