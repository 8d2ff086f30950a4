//! Telemetry Frame - Device line parser
//!
//! One inbound device line (`KEY:value,KEY:value,...`) becomes one
//! [`TelemetryFrame`]. Parsing never fails: garbage in yields an empty or
//! partially typed frame, and field-presence checks downstream decide what
//! happens to it.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// FIELD SCHEMA (agreed with the device firmware)
// ============================================================================

pub const FIELD_EMPLOYEE: &str = "EMP";
pub const FIELD_HEART_RATE: &str = "HR";
pub const FIELD_SLEEP: &str = "SLEEP";
pub const FIELD_STEPS: &str = "STEPS";
pub const FIELD_MOOD: &str = "MOOD";
pub const FIELD_TEMPERATURE: &str = "TEMP";
pub const FIELD_HUMIDITY: &str = "HUM";
pub const FIELD_DISTANCE: &str = "DIST";
pub const FIELD_ACCESS: &str = "IR";

/// Sensor fields carried verbatim into every alert record, in payload order
pub const RAW_SENSOR_FIELDS: &[&str] = &[
    FIELD_HEART_RATE,
    FIELD_TEMPERATURE,
    FIELD_HUMIDITY,
    FIELD_SLEEP,
    FIELD_STEPS,
    FIELD_MOOD,
    FIELD_DISTANCE,
    FIELD_ACCESS,
];

const TOKEN_DELIMITER: char = ',';
const KEY_VALUE_SEPARATOR: char = ':';

// ============================================================================
// VALUES
// ============================================================================

/// A single field value: numeric when it converts, raw text otherwise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn parse(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(n) => FieldValue::Number(n),
            Err(_) => FieldValue::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Field lookup failures shared by the feature extractor and the hazard rules
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("missing field {0}")]
    Missing(&'static str),

    #[error("field {field} is not numeric: {raw:?}")]
    NotNumeric { field: &'static str, raw: String },
}

// ============================================================================
// FRAME
// ============================================================================

/// Parsed key→value record for one device line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    fields: HashMap<String, FieldValue>,
}

impl TelemetryFrame {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Numeric value of a required field
    pub fn number(&self, name: &'static str) -> Result<f64, FieldError> {
        match self.fields.get(name) {
            None => Err(FieldError::Missing(name)),
            Some(FieldValue::Number(n)) => Ok(*n),
            Some(FieldValue::Text(raw)) => Err(FieldError::NotNumeric {
                field: name,
                raw: raw.clone(),
            }),
        }
    }

    /// Employee id as an integer (fractional part truncated)
    pub fn employee_id(&self) -> Result<i64, FieldError> {
        let value = self.number(FIELD_EMPLOYEE)?;
        if !value.is_finite() {
            return Err(FieldError::NotNumeric {
                field: FIELD_EMPLOYEE,
                raw: value.to_string(),
            });
        }
        Ok(value.trunc() as i64)
    }

    /// Compact `KEY:value | KEY:value` rendering of the raw sensor fields
    pub fn sensor_summary(&self) -> String {
        RAW_SENSOR_FIELDS
            .iter()
            .map(|name| match self.fields.get(*name) {
                Some(v) => format!("{}:{}", name, v),
                None => format!("{}:-", name),
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Parse one device line into a frame
///
/// Tokens without a `:` and tokens with an empty key are dropped. The value
/// is split at the first `:` only. Later duplicates overwrite earlier ones.
pub fn parse(line: &str) -> TelemetryFrame {
    let mut frame = TelemetryFrame::default();

    for token in line.trim().split(TOKEN_DELIMITER) {
        let Some((key, value)) = token.split_once(KEY_VALUE_SEPARATOR) else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        frame.insert(key, FieldValue::parse(value.trim()));
    }

    frame
}
