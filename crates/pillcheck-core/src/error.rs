//! Error types for the decision core

use thiserror::Error;

/// Configuration validation failures.
///
/// Expected runtime failures (no model, foreign pill, bad count) are
/// expressed as failing verdicts, never as errors; these variants are
/// reserved for malformed configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("aspect ratio bounds are inverted: min {min} > max {max}")]
    InvertedAspectBounds { min: f32, max: f32 },
}
