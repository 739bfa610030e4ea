//! Aggregation of surviving detections into per-label evidence

use crate::bbox::Detection;
use serde::{Deserialize, Serialize};

/// Aggregated evidence for one distinct label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub n: usize,
}

/// Group detections by exact label string.
///
/// Labels appear in first-occurrence order; each label exactly once.
pub fn label_counts(detections: &[Detection]) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = Vec::new();

    for detection in detections {
        match counts.iter_mut().find(|c| c.label == detection.label) {
            Some(entry) => entry.n += 1,
            None => counts.push(LabelCount {
                label: detection.label.clone(),
                n: 1,
            }),
        }
    }

    counts
}

/// Area-weighted mean confidence of the surviving set.
///
/// Larger boxes carry more evidence. A zero total area (guarded even
/// though the area filter rules it out) falls back to the arithmetic
/// mean; an empty set scores 0.0.
pub fn weighted_confidence(detections: &[Detection]) -> f32 {
    if detections.is_empty() {
        return 0.0;
    }

    let total_area: f32 = detections.iter().map(|d| d.area()).sum();
    if total_area <= 0.0 {
        let total: f32 = detections.iter().map(|d| d.confidence).sum();
        return total / detections.len() as f32;
    }

    detections
        .iter()
        .map(|d| d.confidence * d.area())
        .sum::<f32>()
        / total_area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;

    #[test]
    fn test_label_counts_first_seen_order() {
        let dets = vec![
            Detection::new("red", 0.9, BBox::new(0.0, 0.0, 10.0, 10.0)),
            Detection::new("blue", 0.8, BBox::new(20.0, 0.0, 30.0, 10.0)),
            Detection::new("red", 0.7, BBox::new(40.0, 0.0, 50.0, 10.0)),
        ];

        let counts = label_counts(&dets);
        assert_eq!(
            counts,
            vec![
                LabelCount { label: "red".into(), n: 2 },
                LabelCount { label: "blue".into(), n: 1 },
            ]
        );
    }

    #[test]
    fn test_label_grouping_is_case_sensitive() {
        let dets = vec![
            Detection::new("Red", 0.9, BBox::new(0.0, 0.0, 10.0, 10.0)),
            Detection::new("red", 0.8, BBox::new(20.0, 0.0, 30.0, 10.0)),
        ];

        assert_eq!(label_counts(&dets).len(), 2);
    }

    #[test]
    fn test_weighted_confidence_example() {
        // (0.9*100 + 0.5*300) / 400 = 0.6
        let dets = vec![
            Detection::new("a", 0.9, BBox::new(0.0, 0.0, 10.0, 10.0)),
            Detection::new("a", 0.5, BBox::new(0.0, 0.0, 30.0, 10.0)),
        ];

        assert!((weighted_confidence(&dets) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_confidence_empty_set() {
        assert_eq!(weighted_confidence(&[]), 0.0);
    }

    #[test]
    fn test_weighted_confidence_zero_area_fallback() {
        let dets = vec![
            Detection::new("a", 0.8, BBox::new(0.0, 0.0, 0.0, 10.0)),
            Detection::new("a", 0.4, BBox::new(5.0, 5.0, 5.0, 15.0)),
        ];

        assert!((weighted_confidence(&dets) - 0.6).abs() < 1e-6);
    }
}
