//! Response Types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::logic::alert::SAFE_STATUS;

// ============================================================================
// ACTUATION COMMAND
// ============================================================================

/// Token written back to the wearable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActuationCommand {
    /// Clear the warning indicator
    Safe,
    /// Raise the warning indicator
    Alert,
}

impl ActuationCommand {
    /// "Safe" maps to SAFE, any other status to ALERT
    pub fn for_status(status: &str) -> Self {
        if status == SAFE_STATUS {
            ActuationCommand::Safe
        } else {
            ActuationCommand::Alert
        }
    }

    pub fn token(&self) -> &'static [u8] {
        match self {
            ActuationCommand::Safe => b"SAFE",
            ActuationCommand::Alert => b"ALERT",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActuationCommand::Safe => "SAFE",
            ActuationCommand::Alert => "ALERT",
        }
    }
}

impl fmt::Display for ActuationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ACTUATION RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuationResult {
    pub command: ActuationCommand,
    pub status: ActionStatus,
    pub message: String,
    pub timestamp: i64,
    pub duration_ms: u64,
}

impl ActuationResult {
    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ActuationCommand::for_status("Safe"), ActuationCommand::Safe);
        assert_eq!(ActuationCommand::for_status("Danger Zone"), ActuationCommand::Alert);
        assert_eq!(ActuationCommand::for_status("safe"), ActuationCommand::Alert);
    }

    #[test]
    fn test_tokens_have_no_framing() {
        assert_eq!(ActuationCommand::Safe.token(), b"SAFE");
        assert_eq!(ActuationCommand::Alert.token(), b"ALERT");
    }
}
