//! Bounding box geometry and detection records
//!
//! Core abstraction for representing and comparing detector proposals.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in image pixel coordinates.
///
/// Well-formed boxes satisfy `x1 < x2` and `y1 < y2`; every operation
/// tolerates degenerate boxes and treats them as zero-area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    /// Create a new bounding box from corner coordinates
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Calculate area of the bounding box
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Calculate intersection over union (IoU) with another box
    ///
    /// Returns 0.0 for non-overlapping boxes and whenever the union
    /// area is zero, so degenerate boxes never divide by zero.
    pub fn iou(&self, other: &BBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;

        if union <= 0.0 {
            return 0.0;
        }

        intersection / union
    }

    /// Check if this box overlaps with another above a threshold
    pub fn overlaps(&self, other: &BBox, threshold: f32) -> bool {
        self.iou(other) > threshold
    }
}

/// One candidate pill sighting proposed by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    pub fn area(&self) -> f32 {
        self.bbox.area()
    }

    /// Width over height; 0.0 for boxes with no height.
    pub fn aspect_ratio(&self) -> f32 {
        let height = self.bbox.height();
        if height <= 0.0 {
            0.0
        } else {
            self.bbox.width() / height
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_symmetry_and_bounds() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 5.0, 15.0, 15.0);

        let iou = a.iou(&b);
        assert_eq!(iou, b.iou(&a));
        assert!(iou > 0.0 && iou < 1.0);
    }

    #[test]
    fn test_iou_identity() {
        let a = BBox::new(3.0, 4.0, 20.0, 18.0);
        assert_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_disjoint_is_zero() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);

        // Touching edges count as non-overlapping
        let c = BBox::new(10.0, 0.0, 20.0, 10.0);
        assert_eq!(a.iou(&c), 0.0);
    }

    #[test]
    fn test_iou_degenerate_box() {
        let a = BBox::new(5.0, 5.0, 5.0, 15.0);
        let b = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_aspect_ratio() {
        let det = Detection::new("aspirin", 0.9, BBox::new(0.0, 0.0, 20.0, 10.0));
        assert_eq!(det.aspect_ratio(), 2.0);

        let flat = Detection::new("aspirin", 0.9, BBox::new(0.0, 5.0, 20.0, 5.0));
        assert_eq!(flat.aspect_ratio(), 0.0);
    }
}
