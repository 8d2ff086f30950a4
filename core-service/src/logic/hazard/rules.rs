//! Hazard Thresholds
//!
//! Constants and config only. Logic lives in `evaluator`.

use serde::{Deserialize, Serialize};

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Above this temperature (°C) = Heat Hazard
pub const HEAT_TEMPERATURE_MAX: f64 = 38.0;

/// Above this relative humidity (%) = Heat Hazard
pub const HEAT_HUMIDITY_MAX: f64 = 80.0;

/// Below this distance = Critical Danger Zone (exactly 15 is not critical)
pub const CRITICAL_DISTANCE: f64 = 15.0;

/// Below this distance = Danger Zone (exactly 30 is clear)
pub const DANGER_DISTANCE: f64 = 30.0;

/// Access sensor value meaning "someone is in a restricted area"
pub const ACCESS_TRIGGERED: f64 = 1.0;

// ============================================================================
// CONFIGURABLE THRESHOLDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardThresholds {
    pub temperature_max: f64,
    pub humidity_max: f64,
    pub critical_distance: f64,
    pub danger_distance: f64,
    pub access_triggered: f64,
}

impl Default for HazardThresholds {
    fn default() -> Self {
        Self {
            temperature_max: HEAT_TEMPERATURE_MAX,
            humidity_max: HEAT_HUMIDITY_MAX,
            critical_distance: CRITICAL_DISTANCE,
            danger_distance: DANGER_DISTANCE,
            access_triggered: ACCESS_TRIGGERED,
        }
    }
}
