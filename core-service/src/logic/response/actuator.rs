//! Actuator
//!
//! Best effort: a failed write is reported in the result and logged, never
//! raised to the engine.

use std::time::Instant;

use chrono::Utc;

use super::types::{ActionStatus, ActuationCommand, ActuationResult};
use crate::logic::device::DeviceLink;

/// Write the command for `status` to the device link
pub async fn actuate<L>(link: &mut L, status: &str) -> ActuationResult
where
    L: DeviceLink + ?Sized,
{
    let start = Instant::now();
    let command = ActuationCommand::for_status(status);

    let (status, message) = match link.write_token(command.token()).await {
        Ok(()) => {
            log::debug!("Actuation {} sent", command);
            (ActionStatus::Success, format!("Sent {}", command))
        }
        Err(e) => {
            log::warn!("Actuation {} failed: {}", command, e);
            (ActionStatus::Failed, e.to_string())
        }
    };

    ActuationResult {
        command,
        status,
        message,
        timestamp: Utc::now().timestamp(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}
