//! Secondary classifier capability

use super::CrossCheckError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// Label prediction from the secondary classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// Not every backend reports one.
    pub confidence: Option<f32>,
}

/// External classification capability over extracted feature vectors.
///
/// Read-only and shared, like the detector.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<Prediction, CrossCheckError>;

    /// Expected feature dimensionality.
    fn feature_len(&self) -> usize;
}

/// One labeled class center in feature space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Centroid {
    pub label: String,
    pub values: Vec<f32>,
}

/// Nearest-centroid classifier loaded from a JSON model file.
///
/// The stand-in for the offline-trained pill classifier: one centroid
/// per pill class, nearest Euclidean distance wins, margin against the
/// runner-up becomes the confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroid {
    pub centroids: Vec<Centroid>,
}

impl NearestCentroid {
    pub fn new(centroids: Vec<Centroid>) -> Self {
        Self { centroids }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read classifier model: {:?}", path.as_ref()))?;
        serde_json::from_str(&raw).context("Failed to parse classifier model JSON")
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

impl Classifier for NearestCentroid {
    fn predict(&self, features: &[f32]) -> Result<Prediction, CrossCheckError> {
        if self.centroids.is_empty() {
            return Err(CrossCheckError::EmptyModel);
        }

        let mut distances: Vec<(f32, &str)> = Vec::with_capacity(self.centroids.len());
        for centroid in &self.centroids {
            if centroid.values.len() != features.len() {
                return Err(CrossCheckError::FeatureLength {
                    expected: centroid.values.len(),
                    got: features.len(),
                });
            }
            distances.push((euclidean(features, &centroid.values), &centroid.label));
        }
        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let (nearest, label) = distances[0];
        let confidence = distances.get(1).map(|&(runner_up, _)| {
            let total = nearest + runner_up;
            if total > 0.0 { 1.0 - nearest / total } else { 1.0 }
        });

        Ok(Prediction {
            label: label.to_string(),
            confidence,
        })
    }

    fn feature_len(&self) -> usize {
        self.centroids.first().map_or(0, |c| c.values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> NearestCentroid {
        NearestCentroid::new(vec![
            Centroid {
                label: "aspirin".into(),
                values: vec![0.0, 0.0],
            },
            Centroid {
                label: "ibuprofen".into(),
                values: vec![10.0, 0.0],
            },
        ])
    }

    #[test]
    fn test_nearest_centroid_wins() {
        let prediction = model().predict(&[1.0, 0.0]).unwrap();
        assert_eq!(prediction.label, "aspirin");

        let confidence = prediction.confidence.unwrap();
        assert!(confidence > 0.5 && confidence <= 1.0);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        assert!(model().predict(&[1.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_empty_model_is_an_error() {
        let empty = NearestCentroid::new(Vec::new());
        assert!(empty.predict(&[1.0]).is_err());
    }
}
