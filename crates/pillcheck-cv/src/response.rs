//! Serializable response contract toward the boundary

use crate::crosscheck::CrossCheckSummary;
use pillcheck_core::Verdict;
use serde::Serialize;

/// Wire form of one verification outcome.
///
/// The verdict fields are flattened into the top level; the cross-check
/// block is present only when a classifier was configured, so callers
/// without one see the exact historical shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    #[serde(flatten)]
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_check: Option<CrossCheckSummary>,
}

impl VerifyResponse {
    pub fn new(verdict: Verdict, summary: CrossCheckSummary, annotated_image: String) -> Self {
        let cross_check = summary.enabled.then_some(summary);
        Self {
            verdict,
            annotated_image: Some(annotated_image),
            cross_check,
        }
    }
}
