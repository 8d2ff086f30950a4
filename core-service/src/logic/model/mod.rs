//! Model Module - Fatigue classifier
//!
//! `inference` owns the ONNX session, `classifier` is the shape-checked
//! adapter the engine calls.

pub mod inference;
pub mod classifier;

// Re-export common types
pub use inference::{InferenceError, OnnxFatigueModel};
pub use classifier::{FatigueClassifier, FatigueLabel};
