//! Engine Event Types
//!
//! Immutable, timestamped records of what happened to each frame.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::alert::AlertRecord;

// ============================================================================
// EVENT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    SystemStart,
    SystemStop,
    /// Frame failed extraction, evaluation or classification
    FrameSkipped,
    AlertComposed,
    ActuationFailed,
    AlertDelivered,
    /// Retry budget exhausted
    DeliveryFailed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SystemStart => "system_start",
            EventType::SystemStop => "system_stop",
            EventType::FrameSkipped => "frame_skipped",
            EventType::AlertComposed => "alert_composed",
            EventType::ActuationFailed => "actuation_failed",
            EventType::AlertDelivered => "alert_delivered",
            EventType::DeliveryFailed => "delivery_failed",
        }
    }
}

// ============================================================================
// ENGINE EVENT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEvent {
    pub id: Uuid,
    /// Correlates events of one engine run
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl EngineEvent {
    pub fn new(event_type: EventType, description: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: get_session_id(),
            timestamp: Utc::now(),
            event_type,
            employee_id: None,
            status: None,
            description: description.to_string(),
            metadata: None,
        }
    }

    pub fn with_employee(mut self, employee_id: i64) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ============================================================================
// SESSION ID
// ============================================================================

static SESSION_ID: OnceLock<String> = OnceLock::new();

/// Generated once per process
pub fn get_session_id() -> String {
    SESSION_ID
        .get_or_init(|| Uuid::new_v4().to_string())
        .clone()
}

// ============================================================================
// CONVENIENCE CONSTRUCTORS
// ============================================================================

impl EngineEvent {
    pub fn system_start(version: &str) -> Self {
        Self::new(EventType::SystemStart, &format!("Safety engine v{} started", version))
            .with_metadata(serde_json::json!({ "version": version }))
    }

    pub fn system_stop(uptime_secs: u64, stats: serde_json::Value) -> Self {
        Self::new(
            EventType::SystemStop,
            &format!("Safety engine stopped after {}s", uptime_secs),
        )
        .with_metadata(stats)
    }

    pub fn frame_skipped(employee_id: Option<i64>, reason: &str) -> Self {
        let mut event = Self::new(EventType::FrameSkipped, reason);
        event.employee_id = employee_id;
        event
    }

    pub fn alert_composed(record: &AlertRecord) -> Self {
        Self::new(EventType::AlertComposed, "Alert composed")
            .with_employee(record.employee_id)
            .with_status(&record.status)
            .with_metadata(serde_json::to_value(record).unwrap_or_default())
    }

    pub fn actuation_failed(employee_id: i64, command: &str, error: &str) -> Self {
        Self::new(
            EventType::ActuationFailed,
            &format!("Failed to send {}: {}", command, error),
        )
        .with_employee(employee_id)
    }

    pub fn alert_delivered(record: &AlertRecord, attempts: u32) -> Self {
        Self::new(
            EventType::AlertDelivered,
            &format!("Delivered after {} attempt(s)", attempts),
        )
        .with_employee(record.employee_id)
        .with_status(&record.status)
    }

    pub fn delivery_failed(record: &AlertRecord, attempts: u32, error: &str) -> Self {
        Self::new(
            EventType::DeliveryFailed,
            &format!("Not delivered after {} attempt(s): {}", attempts, error),
        )
        .with_employee(record.employee_id)
        .with_status(&record.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_to_jsonl() {
        let event = EngineEvent::frame_skipped(Some(12), "missing field HR");
        let jsonl = event.to_jsonl();
        assert!(!jsonl.contains('\n'));

        let parsed: EngineEvent = serde_json::from_str(&jsonl).unwrap();
        assert_eq!(parsed.event_type, EventType::FrameSkipped);
        assert_eq!(parsed.employee_id, Some(12));
        assert!(parsed.status.is_none());
    }

    #[test]
    fn test_session_id_consistency() {
        assert_eq!(get_session_id(), get_session_id());
        assert_eq!(
            EngineEvent::system_start("0.1.0").session_id,
            EngineEvent::new(EventType::SystemStop, "x").session_id
        );
    }
}
