//! Alert Record & Composer
//!
//! The composite status is built in a canonical order independent of the
//! order labels were produced in: Fatigue/Burnout, Heat Hazard, proximity
//! tier, Unauthorized Access.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::frame::{
    TelemetryFrame, FIELD_ACCESS, FIELD_DISTANCE, FIELD_HEART_RATE, FIELD_HUMIDITY, FIELD_MOOD,
    FIELD_SLEEP, FIELD_STEPS, FIELD_TEMPERATURE,
};
use crate::logic::hazard::HazardLabel;
use crate::logic::model::FatigueLabel;

/// Status of a frame with no hazards
pub const SAFE_STATUS: &str = "Safe";

pub const STATUS_SEPARATOR: &str = " & ";

// ============================================================================
// RECORD
// ============================================================================

/// One processed frame, as actuated and published
///
/// Serializes to the flat broker payload; `hazards` stays in-process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub employee_id: i64,
    pub status: String,
    /// RFC 3339, microsecond precision, UTC
    pub timestamp: String,

    #[serde(skip)]
    pub hazards: Vec<HazardLabel>,

    #[serde(rename = "HR", default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(rename = "TEMP", default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "HUM", default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(rename = "SLEEP", default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<f64>,
    #[serde(rename = "STEPS", default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<f64>,
    #[serde(rename = "MOOD", default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<f64>,
    #[serde(rename = "DIST", default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(rename = "IR", default, skip_serializing_if = "Option::is_none")]
    pub access: Option<f64>,
}

impl AlertRecord {
    pub fn is_safe(&self) -> bool {
        self.status == SAFE_STATUS
    }

    /// Broker payload bytes
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

// ============================================================================
// COMPOSER
// ============================================================================

/// Canonical status text for a set of labels
///
/// Duplicates collapse to their first occurrence; an empty set is "Safe".
pub fn compose_status(labels: &[HazardLabel]) -> String {
    let ordered = canonical_order(labels);
    if ordered.is_empty() {
        return SAFE_STATUS.to_string();
    }
    ordered
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(STATUS_SEPARATOR)
}

fn canonical_order(labels: &[HazardLabel]) -> Vec<HazardLabel> {
    let mut ordered: Vec<HazardLabel> = Vec::with_capacity(labels.len());
    for label in labels {
        if !ordered.contains(label) {
            ordered.push(*label);
        }
    }
    // Proximity tiers are exclusive; the nearer one wins
    if ordered.contains(&HazardLabel::CriticalDangerZone) {
        ordered.retain(|l| *l != HazardLabel::DangerZone);
    }
    ordered.sort_by_key(|l| l.rank());
    ordered
}

/// Build the record for one frame
pub fn compose(
    employee_id: i64,
    fatigue: FatigueLabel,
    hazards: &[HazardLabel],
    frame: &TelemetryFrame,
) -> AlertRecord {
    let mut labels = Vec::with_capacity(hazards.len() + 1);
    if fatigue.is_fatigued() {
        labels.push(HazardLabel::FatigueBurnout);
    }
    labels.extend_from_slice(hazards);
    let labels = canonical_order(&labels);

    let raw = |name: &str| frame.get(name).and_then(|v| v.as_number());

    AlertRecord {
        employee_id,
        status: compose_status(&labels),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
        hazards: labels,
        heart_rate: raw(FIELD_HEART_RATE),
        temperature: raw(FIELD_TEMPERATURE),
        humidity: raw(FIELD_HUMIDITY),
        sleep: raw(FIELD_SLEEP),
        steps: raw(FIELD_STEPS),
        mood: raw(FIELD_MOOD),
        distance: raw(FIELD_DISTANCE),
        access: raw(FIELD_ACCESS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::frame::parse;

    const LINE: &str = "EMP:7,HR:72,SLEEP:7,STEPS:4000,MOOD:3,TEMP:30,HUM:50,DIST:100,IR:0";

    #[test]
    fn test_empty_is_safe() {
        let record = compose(7, FatigueLabel::Rested, &[], &parse(LINE));
        assert_eq!(record.status, "Safe");
        assert!(record.is_safe());
        assert!(record.hazards.is_empty());
    }

    #[test]
    fn test_full_ordering() {
        let hazards = [
            HazardLabel::UnauthorizedAccess,
            HazardLabel::DangerZone,
            HazardLabel::HeatHazard,
        ];
        let record = compose(7, FatigueLabel::Fatigued, &hazards, &parse(LINE));
        assert_eq!(
            record.status,
            "Fatigue/Burnout & Heat Hazard & Danger Zone & Unauthorized Access"
        );
        assert!(!record.is_safe());
    }

    #[test]
    fn test_duplicates_collapse() {
        let status = compose_status(&[
            HazardLabel::HeatHazard,
            HazardLabel::HeatHazard,
            HazardLabel::CriticalDangerZone,
        ]);
        assert_eq!(status, "Heat Hazard & Critical Danger Zone");
    }

    #[test]
    fn test_nearer_proximity_tier_wins() {
        let hazards = [
            HazardLabel::DangerZone,
            HazardLabel::UnauthorizedAccess,
            HazardLabel::CriticalDangerZone,
        ];
        let record = compose(7, FatigueLabel::Rested, &hazards, &parse(LINE));
        assert_eq!(record.status, "Critical Danger Zone & Unauthorized Access");
        assert_eq!(
            record.hazards,
            vec![HazardLabel::CriticalDangerZone, HazardLabel::UnauthorizedAccess]
        );
    }

    #[test]
    fn test_fatigue_alone() {
        let record = compose(7, FatigueLabel::Fatigued, &[], &parse(LINE));
        assert_eq!(record.status, "Fatigue/Burnout");
    }

    #[test]
    fn test_timestamp_is_utc_rfc3339_micros() {
        let record = compose(7, FatigueLabel::Rested, &[], &parse(LINE));
        assert!(record.timestamp.ends_with("+00:00"));
        let parsed = chrono::DateTime::parse_from_rfc3339(&record.timestamp).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
        // 2025-03-01T08:15:30.123456+00:00
        let fraction = record.timestamp.split('.').nth(1).unwrap();
        assert_eq!(fraction.len(), "123456+00:00".len());
    }

    #[test]
    fn test_payload_shape() {
        let record = compose(7, FatigueLabel::Rested, &[HazardLabel::DangerZone], &parse(LINE));
        let payload: serde_json::Value =
            serde_json::from_slice(&record.to_payload().unwrap()).unwrap();
        let object = payload.as_object().unwrap();

        assert_eq!(object.len(), 11);
        assert_eq!(payload["employee_id"], 7);
        assert_eq!(payload["status"], "Danger Zone");
        assert_eq!(payload["HR"], 72.0);
        assert_eq!(payload["IR"], 0.0);
        assert!(object.get("hazards").is_none());
    }
}
