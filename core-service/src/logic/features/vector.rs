//! Feature Vector - Classifier input
//!
//! **Versioned feature vector built from a telemetry frame**
//!
//! Uses the centralized layout from `layout.rs` for ordering. A missing or
//! non-numeric source field is a hard error for the frame; values are never
//! defaulted.

use serde::{Deserialize, Serialize};

use super::layout::{layout_hash, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
use crate::logic::frame::{FieldError, TelemetryFrame};

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned Feature Vector with layout metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    pub values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    /// Create from raw values with current version
    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Get values as slice
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": FEATURE_LAYOUT.iter()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<std::collections::BTreeMap<_, _>>(),
        })
    }
}

// ============================================================================
// FEATURE EXTRACTOR
// ============================================================================

/// Builds the classifier input from a frame
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Read FEATURE_LAYOUT fields in order
    ///
    /// Fails on the first absent or non-numeric field, naming it.
    pub fn extract(frame: &TelemetryFrame) -> Result<FeatureVector, FieldError> {
        let mut values = [0.0f32; FEATURE_COUNT];
        for (slot, name) in values.iter_mut().zip(FEATURE_LAYOUT.iter().copied()) {
            *slot = frame.number(name)? as f32;
        }
        Ok(FeatureVector::from_values(values))
    }
}
