//! Feature Layout - Classifier input schema
//!
//! **CRITICAL: This file controls the classifier input schema**
//!
//! The fatigue model was trained on exactly these columns in exactly this
//! order. Any change here MUST ship together with a retrained model and a
//! bumped FEATURE_VERSION.

use crc32fast::Hasher;

use crate::logic::frame::{FIELD_HEART_RATE, FIELD_MOOD, FIELD_SLEEP, FIELD_STEPS};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Frame fields in exact classifier input order
pub const FEATURE_LAYOUT: &[&str] = &[
    FIELD_HEART_RATE, // 0: heart rate (bpm)
    FIELD_SLEEP,      // 1: sleep score
    FIELD_STEPS,      // 2: step count
    FIELD_MOOD,       // 3: mood score
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 4;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 of the layout version and field names
/// Logged next to the model so a schema/model mismatch is traceable
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_COUNT, 4);
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_layout_order_matches_training_schema() {
        assert_eq!(FEATURE_LAYOUT, &["HR", "SLEEP", "STEPS", "MOOD"]);
    }

    #[test]
    fn test_layout_hash_consistency() {
        assert_eq!(layout_hash(), layout_hash());
        assert_ne!(layout_hash(), 0);
    }
}
