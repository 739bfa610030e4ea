//! Stored feature scaler

use super::CrossCheckError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Standardizing scaler fitted offline: `(x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl StandardScaler {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read scaler: {:?}", path.as_ref()))?;
        serde_json::from_str(&raw).context("Failed to parse scaler JSON")
    }

    /// Scale a feature vector in place. Zero scale entries only center.
    pub fn transform(&self, features: &mut [f32]) -> Result<(), CrossCheckError> {
        if features.len() != self.mean.len() || self.mean.len() != self.scale.len() {
            return Err(CrossCheckError::FeatureLength {
                expected: self.mean.len(),
                got: features.len(),
            });
        }

        for (i, feature) in features.iter_mut().enumerate() {
            let scale = self.scale[i];
            *feature = if scale.abs() > f32::EPSILON {
                (*feature - self.mean[i]) / scale
            } else {
                *feature - self.mean[i]
            };
        }

        Ok(())
    }
}
