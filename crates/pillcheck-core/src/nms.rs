//! Greedy duplicate suppression over quality-filtered detections

use crate::bbox::Detection;
use std::cmp::Ordering;

/// Remove duplicate observations of the same physical pill.
///
/// Sorts by confidence descending (stable, so ties keep their input
/// order) and walks the list, accepting a candidate only when it
/// overlaps no already-accepted detection above `iou_threshold`.
/// Output is in acceptance order, confidence-descending.
///
/// This is the standard greedy NMS approximation, not a globally
/// optimal matching; the ordering contract is part of the observable
/// behavior and is pinned by tests.
pub fn suppress(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    let before = detections.len();
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut accepted: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let duplicate = accepted
            .iter()
            .any(|kept| kept.bbox.overlaps(&candidate.bbox, iou_threshold));
        if !duplicate {
            accepted.push(candidate);
        }
    }

    log::debug!("suppressor kept {}/{} detections", accepted.len(), before);
    accepted
}
