//! The verification pipeline

use super::config::VerifyConfig;
use crate::crosscheck::{CrossCheckSummary, CrossChecker};
use crate::detector::{Detector, NoopPreprocessor, Preprocessor};
use crate::response::VerifyResponse;
use image::RgbImage;
use pillcheck_core::{Detection, Expectation, Verdict, decide, suppress};
use std::time::{SystemTime, UNIX_EPOCH};

/// End-to-end pill verification over one frame.
///
/// Holds the injected, read-only detector and classifier capabilities;
/// a verifier is reentrant and safe to share across concurrent
/// requests. `verify` never returns an error: every expected failure
/// mode degrades into a failing verdict.
pub struct PillVerifier {
    config: VerifyConfig,
    detector: Box<dyn Detector>,
    preprocessor: Box<dyn Preprocessor>,
    cross_checker: Option<CrossChecker>,
}

impl PillVerifier {
    pub fn new(config: VerifyConfig, detector: Box<dyn Detector>) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector,
            preprocessor: Box::new(NoopPreprocessor),
            cross_checker: None,
        })
    }

    /// Install an image preprocessor (builder style).
    pub fn with_preprocessor(mut self, preprocessor: Box<dyn Preprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Enable the secondary classifier cross-check.
    pub fn with_cross_checker(mut self, cross_checker: CrossChecker) -> Self {
        self.cross_checker = Some(cross_checker);
        self
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Verify one frame against the expectation.
    pub fn verify(&self, image: &RgbImage, expectation: &Expectation) -> VerifyResponse {
        let started = std::time::Instant::now();
        let enhanced = self.preprocessor.enhance(image.clone());

        let raw = match self.detector.detect(
            &enhanced,
            self.config.detector_confidence_floor,
            self.config.detector_iou_floor,
        ) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("detector failed: {e}");
                return VerifyResponse::new(
                    Verdict::detector_unavailable(),
                    CrossCheckSummary::disabled(),
                    annotated_image_id(),
                );
            }
        };

        let response = self.evaluate(raw, expectation, Some(&enhanced));
        log::debug!(
            "verification finished in {} ms: pass={}",
            started.elapsed().as_millis(),
            response.verdict.pass
        );
        response
    }

    /// Verify precomputed detections, skipping the detector capability.
    ///
    /// Without an image the cross-check cannot run, so the primary
    /// verdict stands.
    pub fn verify_detections(
        &self,
        raw: Vec<Detection>,
        expectation: &Expectation,
    ) -> VerifyResponse {
        self.evaluate(raw, expectation, None)
    }

    fn evaluate(
        &self,
        raw: Vec<Detection>,
        expectation: &Expectation,
        image: Option<&RgbImage>,
    ) -> VerifyResponse {
        let filtered = self.config.quality.apply(raw);
        let survivors = suppress(filtered, self.config.iou_threshold);

        let verdict = decide(&survivors, expectation, &self.config.verdict);

        let (verdict, summary) = match (&self.cross_checker, image) {
            (Some(checker), Some(image)) => {
                checker.refine(image, &survivors, expectation, verdict)
            }
            _ => (verdict, CrossCheckSummary::disabled()),
        };

        VerifyResponse::new(verdict, summary, annotated_image_id())
    }
}

/// Identifier for the annotated artifact of this run. The single
/// wall-clock dependence of the pipeline; the decision itself never
/// reads the clock.
fn annotated_image_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("verify-{millis}.jpg")
}
