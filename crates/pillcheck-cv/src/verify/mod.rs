//! High-level verification module

pub mod config;
pub mod verifier;

pub use config::VerifyConfig;
pub use verifier::PillVerifier;
