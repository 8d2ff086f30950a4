//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value can be overridden from the environment (or a `.env` file);
//! `logic::config` assembles them into typed config structs.

use std::path::PathBuf;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "AISE Safety Engine";

// ============================================
// Device link
// ============================================

/// Default serial device the sensor hub is attached to
#[cfg(target_os = "windows")]
pub const DEFAULT_SERIAL_PORT: &str = "COM6";
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";

/// Default baud rate agreed with the device firmware
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default read timeout (ms). Keeps the loop responsive to shutdown.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1_000;

// ============================================
// Classifier
// ============================================

/// Default location of the exported fatigue classifier
pub const DEFAULT_MODEL_PATH: &str = "fatigue_model.onnx";

// ============================================
// Alert broker
// ============================================

/// Default broker host
pub const DEFAULT_MQTT_ENDPOINT: &str = "localhost";

/// Default broker port (MQTT over TLS)
pub const DEFAULT_MQTT_PORT: u16 = 8883;

/// Default MQTT client id
pub const DEFAULT_MQTT_CLIENT_ID: &str = "safety_engine_client";

/// Topic every alert record is published to
pub const DEFAULT_MQTT_TOPIC: &str = "safety/alerts";

/// Keep-alive interval (seconds)
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 30;

/// Connect timeout (ms)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Per-attempt publish timeout (ms)
pub const DEFAULT_PUBLISH_TIMEOUT_MS: u64 = 5_000;

/// Publish attempts per record before reporting permanent failure
pub const DEFAULT_PUBLISH_MAX_ATTEMPTS: u32 = 5;

/// First retry delay (ms), doubled per attempt
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Retry delay ceiling (ms)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 8_000;

// ============================================
// Outcome journal
// ============================================

/// Journal directory name under the local data dir
pub const JOURNAL_DIR_NAME: &str = "safety_logs";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Get serial port path from environment or use default
pub fn get_serial_port() -> String {
    env_opt("AISE_SERIAL_PORT").unwrap_or_else(|| DEFAULT_SERIAL_PORT.to_string())
}

/// Get baud rate from environment or use default
pub fn get_baud_rate() -> u32 {
    env_or("AISE_BAUD_RATE", DEFAULT_BAUD_RATE)
}

/// Get device read timeout (ms) from environment or use default
pub fn get_read_timeout_ms() -> u64 {
    env_or("AISE_READ_TIMEOUT_MS", DEFAULT_READ_TIMEOUT_MS)
}

/// Get classifier artifact path from environment or use default
pub fn get_model_path() -> PathBuf {
    env_opt("AISE_MODEL_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
}

/// Get broker endpoint from environment or use default
pub fn get_mqtt_endpoint() -> String {
    env_opt("MQTT_ENDPOINT").unwrap_or_else(|| DEFAULT_MQTT_ENDPOINT.to_string())
}

/// Get broker port from environment or use default
pub fn get_mqtt_port() -> u16 {
    env_or("MQTT_PORT", DEFAULT_MQTT_PORT)
}

/// Get MQTT client id from environment or use default
pub fn get_mqtt_client_id() -> String {
    env_opt("MQTT_CLIENT_ID").unwrap_or_else(|| DEFAULT_MQTT_CLIENT_ID.to_string())
}

/// Get alert topic from environment or use default
pub fn get_mqtt_topic() -> String {
    env_opt("MQTT_TOPIC").unwrap_or_else(|| DEFAULT_MQTT_TOPIC.to_string())
}

/// CA bundle path (TLS is enabled only when CA, cert and key are all set)
pub fn get_mqtt_ca_path() -> Option<PathBuf> {
    env_opt("MQTT_CA_PATH").map(PathBuf::from)
}

/// Client certificate path
pub fn get_mqtt_cert_path() -> Option<PathBuf> {
    env_opt("MQTT_CERT_PATH").map(PathBuf::from)
}

/// Client private key path
pub fn get_mqtt_key_path() -> Option<PathBuf> {
    env_opt("MQTT_KEY_PATH").map(PathBuf::from)
}

/// Get keep-alive (seconds) from environment or use default
pub fn get_keep_alive_secs() -> u64 {
    env_or("MQTT_KEEP_ALIVE_SECS", DEFAULT_KEEP_ALIVE_SECS)
}

/// Get connect timeout (ms) from environment or use default
pub fn get_connect_timeout_ms() -> u64 {
    env_or("MQTT_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS)
}

/// Get publish timeout (ms) from environment or use default
pub fn get_publish_timeout_ms() -> u64 {
    env_or("PUBLISH_TIMEOUT_MS", DEFAULT_PUBLISH_TIMEOUT_MS)
}

/// Get publish attempt budget from environment or use default
pub fn get_publish_max_attempts() -> u32 {
    env_or("PUBLISH_MAX_ATTEMPTS", DEFAULT_PUBLISH_MAX_ATTEMPTS)
}

/// Get backoff base (ms) from environment or use default
pub fn get_backoff_base_ms() -> u64 {
    env_or("PUBLISH_BACKOFF_BASE_MS", DEFAULT_BACKOFF_BASE_MS)
}

/// Get backoff ceiling (ms) from environment or use default
pub fn get_backoff_max_ms() -> u64 {
    env_or("PUBLISH_BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS)
}

/// Check if the outcome journal is enabled
pub fn is_journal_enabled() -> bool {
    std::env::var("AISE_JOURNAL_ENABLED")
        .map(|s| s.to_lowercase() != "false" && s != "0")
        .unwrap_or(true)
}

/// Get journal directory from environment or use the local data dir
pub fn get_journal_dir() -> PathBuf {
    env_opt("AISE_JOURNAL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("aise")
                .join(JOURNAL_DIR_NAME)
        })
}
