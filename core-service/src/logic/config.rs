//! Engine configuration
//!
//! Every value has a compiled-in default in `constants` and an environment
//! override. `validate` catches values that would make the engine hang or
//! spin before any connection is opened.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::logic::cloud_sync::{PublisherConfig, RetryPolicy};
use crate::logic::device::LinkConfig;
use crate::logic::hazard::HazardThresholds;
use crate::logic::telemetry::JournalConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("backoff base {base_ms}ms exceeds cap {max_ms}ms")]
    BackoffInverted { base_ms: u128, max_ms: u128 },

    #[error("danger distance {danger} must not be below critical distance {critical}")]
    ProximityInverted { critical: String, danger: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl ModelConfig {
    pub fn from_env() -> Self {
        Self {
            path: constants::get_model_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub link: LinkConfig,
    pub model: ModelConfig,
    pub publisher: PublisherConfig,
    pub retry: RetryPolicy,
    pub journal: JournalConfig,
    pub thresholds: HazardThresholds,
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            link: LinkConfig::from_env(),
            model: ModelConfig::from_env(),
            publisher: PublisherConfig::from_env(),
            retry: RetryPolicy::from_env(),
            journal: JournalConfig::from_env(),
            thresholds: HazardThresholds::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.link.port.trim().is_empty() {
            return Err(ConfigError::Empty("AISE_SERIAL_PORT"));
        }
        if self.link.baud_rate == 0 {
            return Err(ConfigError::Zero("AISE_BAUD_RATE"));
        }
        non_zero(self.link.read_timeout, "AISE_READ_TIMEOUT_MS")?;

        if self.model.path.as_os_str().is_empty() {
            return Err(ConfigError::Empty("AISE_MODEL_PATH"));
        }

        if self.publisher.endpoint.trim().is_empty() {
            return Err(ConfigError::Empty("MQTT_ENDPOINT"));
        }
        if self.publisher.topic.trim().is_empty() {
            return Err(ConfigError::Empty("MQTT_TOPIC"));
        }
        if self.publisher.client_id.trim().is_empty() {
            return Err(ConfigError::Empty("MQTT_CLIENT_ID"));
        }
        if self.publisher.port == 0 {
            return Err(ConfigError::Zero("MQTT_PORT"));
        }
        non_zero(self.publisher.connect_timeout, "MQTT_CONNECT_TIMEOUT_MS")?;
        non_zero(self.publisher.publish_timeout, "PUBLISH_TIMEOUT_MS")?;

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Zero("PUBLISH_MAX_ATTEMPTS"));
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(ConfigError::BackoffInverted {
                base_ms: self.retry.base_delay.as_millis(),
                max_ms: self.retry.max_delay.as_millis(),
            });
        }

        if self.thresholds.danger_distance < self.thresholds.critical_distance {
            return Err(ConfigError::ProximityInverted {
                critical: self.thresholds.critical_distance.to_string(),
                danger: self.thresholds.danger_distance.to_string(),
            });
        }

        Ok(())
    }
}

fn non_zero(value: Duration, name: &'static str) -> Result<(), ConfigError> {
    if value.is_zero() {
        Err(ConfigError::Zero(name))
    } else {
        Ok(())
    }
}
