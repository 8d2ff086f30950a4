//! Test doubles for the device link, classifier model and broker

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::logic::cloud_sync::client::CloudError;
use crate::logic::cloud_sync::{BrokerTransport, PublisherConfig, RetryPolicy};
use crate::logic::device::{DeviceLink, LinkError};
use crate::logic::features::FEATURE_COUNT;
use crate::logic::model::inference::FatigueModel;
use crate::logic::model::InferenceError;
use crate::logic::telemetry::recorder::LOG_EXT;
use crate::logic::telemetry::EngineEvent;

// ============================================================================
// MODELS
// ============================================================================

/// Always returns the same label
pub struct FixedModel {
    pub label: i64,
    pub width: usize,
}

impl FixedModel {
    pub fn new(label: i64) -> Self {
        Self {
            label,
            width: FEATURE_COUNT,
        }
    }
}

impl FatigueModel for FixedModel {
    fn input_width(&self) -> usize {
        self.width
    }

    fn predict(&self, _features: &[f32]) -> Result<i64, InferenceError> {
        Ok(self.label)
    }
}

/// Fatigued when HR > 100 and SLEEP < 5
pub struct ThresholdModel;

impl FatigueModel for ThresholdModel {
    fn input_width(&self) -> usize {
        FEATURE_COUNT
    }

    fn predict(&self, features: &[f32]) -> Result<i64, InferenceError> {
        Ok((features[0] > 100.0 && features[1] < 5.0) as i64)
    }
}

// ============================================================================
// DEVICE LINK
// ============================================================================

#[derive(Default)]
struct LinkState {
    lines: VecDeque<String>,
    written: Vec<Vec<u8>>,
    closed: bool,
    fail_writes: bool,
    fail_reads: bool,
    reads_attempted: u32,
    idle_when_drained: bool,
}

/// Scripted link; clones share state so tests can inspect it after handing
/// a clone to the engine
#[derive(Clone)]
pub struct FakeLink {
    state: Arc<Mutex<LinkState>>,
}

impl FakeLink {
    /// Yields `lines` in order, then reports the link closed
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let state = LinkState {
            lines: lines.into_iter().map(Into::into).collect(),
            ..LinkState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn failing_writes(self) -> Self {
        self.state.lock().fail_writes = true;
        self
    }

    /// Every read fails with a non-terminal I/O error once the lines run out
    pub fn failing_reads(self) -> Self {
        self.state.lock().fail_reads = true;
        self
    }

    /// Time out instead of closing once the lines run out
    pub fn idle_when_drained(self) -> Self {
        self.state.lock().idle_when_drained = true;
        self
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().written.clone()
    }

    pub fn written_tokens(&self) -> Vec<String> {
        self.written()
            .iter()
            .map(|w| String::from_utf8_lossy(w).to_string())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn reads_attempted(&self) -> u32 {
        self.state.lock().reads_attempted
    }
}

#[async_trait]
impl DeviceLink for FakeLink {
    async fn read_line(&mut self) -> Result<Option<String>, LinkError> {
        let idle = {
            let mut state = self.state.lock();
            state.reads_attempted += 1;
            if state.closed {
                return Err(LinkError::Closed);
            }
            if let Some(line) = state.lines.pop_front() {
                return Ok(Some(line));
            }
            if state.fail_reads {
                return Err(LinkError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "injected read failure",
                )));
            }
            if !state.idle_when_drained {
                return Err(LinkError::Closed);
            }
            true
        };
        if idle {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Ok(None)
    }

    async fn write_token(&mut self, token: &[u8]) -> Result<(), LinkError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(LinkError::Closed);
        }
        if state.fail_writes {
            return Err(LinkError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "injected write failure",
            )));
        }
        state.written.push(token.to_vec());
        Ok(())
    }

    async fn close(&mut self) {
        self.state.lock().closed = true;
    }
}

// ============================================================================
// BROKER
// ============================================================================

/// Scripted result of one publish call; an empty script means success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ok,
    Fail,
    /// Fails and drops the session
    Disconnect,
    /// Never completes
    Hang,
}

pub struct FakeTransport {
    connected: bool,
    script: VecDeque<Step>,
    connect_failures: u32,
    connect_calls: u32,
    publish_calls: u32,
    disconnect_calls: u32,
    delivered: Vec<(String, Vec<u8>)>,
}

impl FakeTransport {
    pub fn connected() -> Self {
        Self {
            connected: true,
            script: VecDeque::new(),
            connect_failures: 0,
            connect_calls: 0,
            publish_calls: 0,
            disconnect_calls: 0,
            delivered: Vec::new(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::connected()
        }
    }

    pub fn script(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script.extend(steps);
        self
    }

    /// The next `n` connect calls fail
    pub fn failing_connects(mut self, n: u32) -> Self {
        self.connect_failures = n;
        self
    }

    pub fn delivered(&self) -> &[(String, Vec<u8>)] {
        &self.delivered
    }

    pub fn connect_calls(&self) -> u32 {
        self.connect_calls
    }

    pub fn publish_calls(&self) -> u32 {
        self.publish_calls
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.disconnect_calls
    }
}

#[async_trait]
impl BrokerTransport for FakeTransport {
    async fn connect(&mut self) -> Result<(), CloudError> {
        self.connect_calls += 1;
        if self.connect_failures > 0 {
            self.connect_failures -= 1;
            return Err(CloudError::ConnectionRefused("injected".to_string()));
        }
        self.connected = true;
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), CloudError> {
        self.publish_calls += 1;
        if !self.connected {
            return Err(CloudError::Disconnected("not connected".to_string()));
        }
        match self.script.pop_front().unwrap_or(Step::Ok) {
            Step::Ok => {
                self.delivered.push((topic.to_string(), payload));
                Ok(())
            }
            Step::Fail => Err(CloudError::Client("injected failure".to_string())),
            Step::Disconnect => {
                self.connected = false;
                Err(CloudError::Disconnected("injected disconnect".to_string()))
            }
            Step::Hang => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self) {
        self.disconnect_calls += 1;
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ============================================================================
// CONFIG HELPERS
// ============================================================================

pub fn fast_publisher_config() -> PublisherConfig {
    PublisherConfig {
        endpoint: "localhost".to_string(),
        port: 1883,
        client_id: "safety_engine_test".to_string(),
        topic: "safety/alerts".to_string(),
        ca_path: None,
        cert_path: None,
        key_path: None,
        keep_alive: Duration::from_secs(30),
        connect_timeout: Duration::from_millis(50),
        publish_timeout: Duration::from_millis(50),
    }
}

pub fn fast_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
    }
}

// ============================================================================
// JOURNAL
// ============================================================================

/// Every event journaled under `dir`, oldest file first
pub fn read_journal(dir: &Path) -> Vec<EngineEvent> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().map_or(false, |e| e == LOG_EXT))
        .collect();
    // Names embed timestamp and sequence
    files.sort();

    files
        .iter()
        .flat_map(|file| {
            std::fs::read_to_string(file)
                .unwrap()
                .lines()
                .filter(|line| !line.is_empty())
                .map(|line| serde_json::from_str::<EngineEvent>(line).unwrap())
                .collect::<Vec<_>>()
        })
        .collect()
}
