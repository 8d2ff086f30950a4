//! Features Module - Classifier input extraction
//!
//! Turns a parsed telemetry frame into the fixed-order vector the fatigue
//! classifier was trained on.

pub mod layout;
pub mod vector;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::FEATURE_COUNT;
pub use vector::{FeatureExtractor, FeatureVector};
