//! Feature extraction for the cross-check classifier

use crate::roi;
use image::RgbImage;

/// Mean and standard deviation per RGB channel.
const COLOR_STATS: usize = 6;

/// Extracts a fixed-length feature vector from a cropped pill region:
/// color summary statistics followed by a flattened low-resolution
/// grayscale patch. The length is a configuration-time constant and
/// must match the configured classifier.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    patch_size: u32,
}

impl FeatureExtractor {
    pub fn new(patch_size: u32) -> Self {
        Self { patch_size }
    }

    /// Feature dimensionality for this configuration.
    pub fn feature_len(&self) -> usize {
        COLOR_STATS + (self.patch_size * self.patch_size) as usize
    }

    /// Extract features from a non-empty region. All values are scaled
    /// to [0, 1].
    pub fn extract(&self, region: &RgbImage) -> Vec<f32> {
        let mut features = Vec::with_capacity(self.feature_len());

        let pixel_count = (region.width() * region.height()) as f32;
        let mut sums = [0.0f32; 3];
        let mut squares = [0.0f32; 3];
        for pixel in region.pixels() {
            for channel in 0..3 {
                let value = pixel[channel] as f32 / 255.0;
                sums[channel] += value;
                squares[channel] += value * value;
            }
        }

        for channel in 0..3 {
            features.push(sums[channel] / pixel_count);
        }
        for channel in 0..3 {
            let mean = sums[channel] / pixel_count;
            let variance = (squares[channel] / pixel_count - mean * mean).max(0.0);
            features.push(variance.sqrt());
        }

        let patch = roi::gray_patch(region, self.patch_size);
        features.extend(patch.pixels().map(|p| p[0] as f32 / 255.0));

        features
    }
}
