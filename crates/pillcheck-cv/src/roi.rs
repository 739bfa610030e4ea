//! Region-of-interest cropping for the cross-check

use image::{GrayImage, RgbImage, imageops};
use pillcheck_core::BBox;

/// Crop outcome; a clamped region can be empty at the image edge.
#[derive(Debug, Clone)]
pub enum Roi {
    Region(RgbImage),
    Degenerate,
}

/// Crop a detection box with fixed pixel padding, clamped to the image
/// bounds.
pub fn crop_padded(image: &RgbImage, bbox: &BBox, padding: u32) -> Roi {
    let (width, height) = image.dimensions();
    let pad = padding as f32;

    let x1 = (bbox.x1 - pad).max(0.0).floor() as u32;
    let y1 = (bbox.y1 - pad).max(0.0).floor() as u32;
    let x2 = (bbox.x2 + pad).min(width as f32).ceil() as u32;
    let y2 = (bbox.y2 + pad).min(height as f32).ceil() as u32;

    if x2 <= x1 || y2 <= y1 {
        return Roi::Degenerate;
    }

    let region = imageops::crop_imm(image, x1, y1, x2 - x1, y2 - y1).to_image();
    Roi::Region(region)
}

/// Downscale a region to a square grayscale patch.
pub fn gray_patch(region: &RgbImage, size: u32) -> GrayImage {
    let gray = imageops::grayscale(region);
    imageops::resize(&gray, size, size, imageops::FilterType::Triangle)
}
