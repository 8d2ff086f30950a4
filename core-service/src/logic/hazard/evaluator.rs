//! Hazard Rule Evaluator
//!
//! Rules run in a fixed order (heat, proximity, access) so the composite
//! status is reproducible. Every input field is read before any rule fires:
//! one bad field fails the whole frame.

use super::rules::HazardThresholds;
use super::types::HazardLabel;
use crate::logic::frame::{
    FieldError, TelemetryFrame, FIELD_ACCESS, FIELD_DISTANCE, FIELD_HUMIDITY, FIELD_TEMPERATURE,
};

/// Environmental readings the rules need
#[derive(Debug, Clone, Copy, PartialEq)]
struct RuleInputs {
    temperature: f64,
    humidity: f64,
    distance: f64,
    access: f64,
}

impl RuleInputs {
    fn read(frame: &TelemetryFrame) -> Result<Self, FieldError> {
        Ok(Self {
            temperature: frame.number(FIELD_TEMPERATURE)?,
            humidity: frame.number(FIELD_HUMIDITY)?,
            distance: frame.number(FIELD_DISTANCE)?,
            access: frame.number(FIELD_ACCESS)?,
        })
    }
}

/// Evaluate the rule set against a frame
pub fn evaluate(
    frame: &TelemetryFrame,
    thresholds: &HazardThresholds,
) -> Result<Vec<HazardLabel>, FieldError> {
    let inputs = RuleInputs::read(frame)?;
    let mut hazards = Vec::with_capacity(3);

    if let Some(label) = heat_rule(&inputs, thresholds) {
        hazards.push(label);
    }
    if let Some(label) = proximity_rule(&inputs, thresholds) {
        hazards.push(label);
    }
    if let Some(label) = access_rule(&inputs, thresholds) {
        hazards.push(label);
    }

    Ok(hazards)
}

fn heat_rule(inputs: &RuleInputs, t: &HazardThresholds) -> Option<HazardLabel> {
    (inputs.temperature > t.temperature_max || inputs.humidity > t.humidity_max)
        .then_some(HazardLabel::HeatHazard)
}

/// Nearer tier wins; cut-points are exclusive upper bounds
fn proximity_rule(inputs: &RuleInputs, t: &HazardThresholds) -> Option<HazardLabel> {
    if inputs.distance < t.critical_distance {
        Some(HazardLabel::CriticalDangerZone)
    } else if inputs.distance < t.danger_distance {
        Some(HazardLabel::DangerZone)
    } else {
        None
    }
}

fn access_rule(inputs: &RuleInputs, t: &HazardThresholds) -> Option<HazardLabel> {
    #[allow(clippy::float_cmp)]
    let triggered = inputs.access == t.access_triggered;
    triggered.then_some(HazardLabel::UnauthorizedAccess)
}
