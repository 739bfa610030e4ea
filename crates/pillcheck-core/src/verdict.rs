//! Layered pass/fail policy over aggregated detection evidence

use crate::aggregate::{LabelCount, label_counts, weighted_confidence};
use crate::bbox::Detection;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Caller-supplied intent to verify against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    /// Expected pill label; `None` means any type is acceptable.
    pub label: Option<String>,
    /// Expected pill count; `None` or zero means unconstrained.
    pub count: Option<u32>,
}

impl Expectation {
    /// Expectation with no constraints at all.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            count: None,
        }
    }

    /// Set the expected count (builder style).
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Label normalized for comparison: trimmed and lowercased.
    ///
    /// A blank label counts as absent.
    pub fn normalized_label(&self) -> Option<String> {
        self.label
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
    }

    /// The count constraint, if one is active.
    pub fn constrained_count(&self) -> Option<u32> {
        self.count.filter(|&c| c > 0)
    }
}

/// Raw expectation payload as accepted at the boundary.
///
/// Historical clients named the pill field differently; the first
/// non-empty of `label`, `pill`, `pillType`, `pill_name` wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExpectation {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub pill: Option<String>,
    #[serde(default, rename = "pillType")]
    pub pill_type: Option<String>,
    #[serde(default)]
    pub pill_name: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
}

impl RawExpectation {
    /// Resolve the legacy aliases into a clean expectation.
    pub fn resolve(self) -> Expectation {
        let label = [self.label, self.pill, self.pill_type, self.pill_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty());

        // Negative or zero counts mean unconstrained
        let count = self
            .count
            .and_then(|c| u32::try_from(c).ok())
            .filter(|&c| c > 0);

        Expectation { label, count }
    }
}

/// Why a verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchReason {
    None,
    NoDetection,
    LowConfidence,
    ForeignType,
    TypeNotFound,
    CountMismatch,
    DetectorUnavailable,
}

/// Final decision plus supporting evidence for one verification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub pass: bool,
    /// Total surviving detections.
    pub count: usize,
    pub classes_detected: Vec<LabelCount>,
    /// Area-weighted mean confidence of the survivors.
    pub confidence: f32,
    pub mismatch_reason: MismatchReason,
}

impl Verdict {
    /// Failing verdict for a missing or unloadable detector model.
    pub fn detector_unavailable() -> Self {
        Self {
            pass: false,
            count: 0,
            classes_detected: Vec::new(),
            confidence: 0.0,
            mismatch_reason: MismatchReason::DetectorUnavailable,
        }
    }
}

/// Tunables of the verdict engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictPolicy {
    /// Overall-confidence floor, applied when no label is expected.
    pub min_confidence: f32,
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self { min_confidence: 0.5 }
    }
}

impl VerdictPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::OutOfRange {
                name: "min_confidence",
                value: self.min_confidence,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

/// Apply the layered pass/fail policy to the deduplicated survivor set.
pub fn decide(
    survivors: &[Detection],
    expectation: &Expectation,
    policy: &VerdictPolicy,
) -> Verdict {
    let count = survivors.len();
    let classes_detected = label_counts(survivors);
    let confidence = weighted_confidence(survivors);

    let (pass, mismatch_reason) = match expectation.normalized_label() {
        Some(expected) => decide_labeled(survivors, &expected, expectation.constrained_count()),
        None => decide_unlabeled(count, confidence, expectation.constrained_count(), policy),
    };

    log::debug!(
        "verdict: pass={} count={} confidence={:.3} reason={:?}",
        pass,
        count,
        confidence,
        mismatch_reason
    );

    Verdict {
        pass,
        count,
        classes_detected,
        confidence,
        mismatch_reason,
    }
}

/// Decision modes when a pill type is expected, in priority order.
///
/// A container holds exactly one pill type: a single foreign-labeled
/// detection fails the whole container, even when the expected label's
/// count would otherwise be correct.
fn decide_labeled(
    survivors: &[Detection],
    expected: &str,
    expected_count: Option<u32>,
) -> (bool, MismatchReason) {
    let matches_expected = |d: &Detection| d.label.trim().to_lowercase() == expected;

    if survivors.iter().any(|d| !matches_expected(d)) {
        return (false, MismatchReason::ForeignType);
    }

    let matching = survivors.iter().filter(|d| matches_expected(d)).count();
    if matching == 0 {
        return (false, MismatchReason::TypeNotFound);
    }

    if let Some(n) = expected_count {
        if matching != n as usize {
            return (false, MismatchReason::CountMismatch);
        }
    }

    (true, MismatchReason::None)
}

fn decide_unlabeled(
    count: usize,
    confidence: f32,
    expected_count: Option<u32>,
    policy: &VerdictPolicy,
) -> (bool, MismatchReason) {
    let count_ok = expected_count.is_none_or(|n| count == n as usize);

    if count_ok && confidence >= policy.min_confidence {
        return (true, MismatchReason::None);
    }

    if count == 0 {
        (false, MismatchReason::NoDetection)
    } else if confidence < policy.min_confidence {
        (false, MismatchReason::LowConfidence)
    } else {
        (false, MismatchReason::CountMismatch)
    }
}
