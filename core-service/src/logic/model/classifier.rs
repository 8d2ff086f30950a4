//! Fatigue Classifier Adapter
//!
//! Stable `classify(features) -> label` boundary around whatever model is
//! loaded. The adapter validates the input shape and the output domain; it
//! never trains, updates or otherwise touches the model state.

use serde::Serialize;

use super::inference::{FatigueModel, InferenceError};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

/// Binary classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FatigueLabel {
    /// Label 0
    Rested,
    /// Label 1 -> "Fatigue/Burnout"
    Fatigued,
}

impl FatigueLabel {
    pub fn from_raw(raw: i64) -> Result<Self, InferenceError> {
        match raw {
            0 => Ok(FatigueLabel::Rested),
            1 => Ok(FatigueLabel::Fatigued),
            other => Err(InferenceError::InvalidLabel(other)),
        }
    }

    pub fn is_fatigued(&self) -> bool {
        matches!(self, FatigueLabel::Fatigued)
    }
}

pub struct FatigueClassifier {
    model: Box<dyn FatigueModel>,
}

impl FatigueClassifier {
    /// Wrap a loaded model. Rejects models whose input width differs from
    /// the feature layout.
    pub fn new(model: Box<dyn FatigueModel>) -> Result<Self, InferenceError> {
        let width = model.input_width();
        if width != FEATURE_COUNT {
            return Err(InferenceError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: width,
            });
        }
        Ok(Self { model })
    }

    pub fn classify(&self, features: &FeatureVector) -> Result<FatigueLabel, InferenceError> {
        self.classify_slice(features.as_slice())
    }

    /// Shape-checked inference on a raw row
    pub fn classify_slice(&self, features: &[f32]) -> Result<FatigueLabel, InferenceError> {
        if features.len() != FEATURE_COUNT {
            return Err(InferenceError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: features.len(),
            });
        }
        let raw = self.model.predict(features)?;
        FatigueLabel::from_raw(raw)
    }
}
