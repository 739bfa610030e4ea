//! Pillcheck decision core
//!
//! Pure pass/fail logic for pill-container verification: geometry,
//! quality filtering, duplicate suppression, aggregation and the layered
//! verdict policy. No pixels, no I/O, no clocks: given the same
//! detections and expectation, the same verdict comes out.

pub mod aggregate;
pub mod alert;
pub mod bbox;
pub mod error;
pub mod filter;
pub mod nms;
pub mod verdict;

// Re-export commonly used types
pub use aggregate::{LabelCount, label_counts, weighted_confidence};
pub use bbox::{BBox, Detection};
pub use error::ConfigError;
pub use filter::QualityConfig;
pub use nms::suppress;
pub use verdict::{
    Expectation, MismatchReason, RawExpectation, Verdict, VerdictPolicy, decide,
};
