//! Pillcheck computer-vision layer
//!
//! Capability seams around the external detector and classifier models,
//! ROI feature extraction for the cross-check, and the verification
//! pipeline that drives the pillcheck-core decision logic.

pub mod crosscheck;
pub mod detector;
pub mod response;
pub mod roi;
pub mod verify;

// Re-export commonly used types
pub use crosscheck::{CrossCheckConfig, CrossCheckSummary, CrossChecker};
pub use detector::{
    Detector, DetectorError, MockDetector, NoopPreprocessor, Preprocessor, StaticDetector,
    UnavailableDetector,
};
pub use response::VerifyResponse;
pub use verify::{PillVerifier, VerifyConfig};

// Error handling
pub type Result<T> = anyhow::Result<T>;
