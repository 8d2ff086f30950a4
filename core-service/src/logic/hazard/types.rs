//! Hazard Types

use std::fmt;

use serde::{Deserialize, Serialize};

/// One detected condition for a frame
///
/// Variant order is the canonical status order; `rank` must stay in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardLabel {
    #[serde(rename = "Fatigue/Burnout")]
    FatigueBurnout,
    #[serde(rename = "Heat Hazard")]
    HeatHazard,
    #[serde(rename = "Critical Danger Zone")]
    CriticalDangerZone,
    #[serde(rename = "Danger Zone")]
    DangerZone,
    #[serde(rename = "Unauthorized Access")]
    UnauthorizedAccess,
}

impl HazardLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardLabel::FatigueBurnout => "Fatigue/Burnout",
            HazardLabel::HeatHazard => "Heat Hazard",
            HazardLabel::CriticalDangerZone => "Critical Danger Zone",
            HazardLabel::DangerZone => "Danger Zone",
            HazardLabel::UnauthorizedAccess => "Unauthorized Access",
        }
    }

    /// Position in the composite status. Both proximity tiers share a slot.
    pub fn rank(&self) -> u8 {
        match self {
            HazardLabel::FatigueBurnout => 0,
            HazardLabel::HeatHazard => 1,
            HazardLabel::CriticalDangerZone | HazardLabel::DangerZone => 2,
            HazardLabel::UnauthorizedAccess => 3,
        }
    }

}

impl fmt::Display for HazardLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
