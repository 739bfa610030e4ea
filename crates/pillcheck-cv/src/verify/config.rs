//! Verification pipeline configuration

use crate::crosscheck::CrossCheckConfig;
use pillcheck_core::{ConfigError, QualityConfig, VerdictPolicy};
use serde::{Deserialize, Serialize};

/// End-to-end tunables for one verifier instance.
///
/// Every threshold here moved across tuning iterations; none is
/// hardcoded in the stages. Defaults are the last-observed values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Confidence floor handed to the detector backend. Deliberately
    /// looser than the quality filter, which is the real gate.
    pub detector_confidence_floor: f32,
    /// IoU floor handed to the detector's own internal suppression.
    pub detector_iou_floor: f32,
    pub quality: QualityConfig,
    /// Overlap above which two surviving proposals are one pill.
    pub iou_threshold: f32,
    pub verdict: VerdictPolicy,
    pub cross_check: CrossCheckConfig,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            detector_confidence_floor: 0.25,
            detector_iou_floor: 0.70,
            quality: QualityConfig::default(),
            iou_threshold: 0.45,
            verdict: VerdictPolicy::default(),
            cross_check: CrossCheckConfig::default(),
        }
    }
}

impl VerifyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quality.validate()?;
        self.verdict.validate()?;

        for (name, value) in [
            ("detector_confidence_floor", self.detector_confidence_floor),
            ("detector_iou_floor", self.detector_iou_floor),
            ("iou_threshold", self.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(VerifyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let config = VerifyConfig {
            iou_threshold: 1.5,
            ..VerifyConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
