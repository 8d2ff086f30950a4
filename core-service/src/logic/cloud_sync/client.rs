//! Broker Client
//!
//! MQTT 3.1.1 session to the alert broker. A background task drives the
//! rumqttc event loop and forwards the packets the publisher cares about
//! (ConnAck, outgoing publish ids, PubAck) over a channel.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    TlsConfiguration, Transport,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use crate::constants;

/// Request channel capacity handed to rumqttc
const REQUEST_CAPACITY: usize = 16;

const DISCONNECT_GRACE: Duration = Duration::from_millis(500);

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: &'static str, after_ms: u64 },

    #[error("broker connection lost: {0}")]
    Disconnected(String),

    #[error("broker refused connection: {0}")]
    ConnectionRefused(String),

    #[error("mqtt client error: {0}")]
    Client(String),

    #[error("failed to read TLS material {path}: {message}")]
    Tls { path: PathBuf, message: String },

    #[error("failed to serialize alert: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CloudError {
    pub fn timeout(operation: &'static str, after: Duration) -> Self {
        CloudError::Timeout {
            operation,
            after_ms: after.as_millis() as u64,
        }
    }
}

// ============================================================================
// CONFIG
// ============================================================================

/// Broker connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherConfig {
    pub endpoint: String,
    pub port: u16,
    pub client_id: String,
    pub topic: String,
    pub ca_path: Option<PathBuf>,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    pub keep_alive: Duration,
    pub connect_timeout: Duration,
    pub publish_timeout: Duration,
}

impl PublisherConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: constants::get_mqtt_endpoint(),
            port: constants::get_mqtt_port(),
            client_id: constants::get_mqtt_client_id(),
            topic: constants::get_mqtt_topic(),
            ca_path: constants::get_mqtt_ca_path(),
            cert_path: constants::get_mqtt_cert_path(),
            key_path: constants::get_mqtt_key_path(),
            keep_alive: Duration::from_secs(constants::get_keep_alive_secs()),
            connect_timeout: Duration::from_millis(constants::get_connect_timeout_ms()),
            publish_timeout: Duration::from_millis(constants::get_publish_timeout_ms()),
        }
    }

    /// CA, client certificate and key; mutual TLS needs all three
    pub fn tls_files(&self) -> Option<(&PathBuf, &PathBuf, &PathBuf)> {
        match (&self.ca_path, &self.cert_path, &self.key_path) {
            (Some(ca), Some(cert), Some(key)) => Some((ca, cert, key)),
            _ => None,
        }
    }
}

// ============================================================================
// TRANSPORT TRAIT
// ============================================================================

/// Persistent broker session as seen by the publisher
#[async_trait]
pub trait BrokerTransport: Send {
    /// Establish (or re-establish) the session
    async fn connect(&mut self) -> Result<(), CloudError>;

    /// Publish at least once; resolves when the broker acknowledges
    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), CloudError>;

    async fn disconnect(&mut self);

    fn is_connected(&self) -> bool;
}

// ============================================================================
// MQTT IMPLEMENTATION
// ============================================================================

#[derive(Debug)]
enum SessionEvent {
    Connected,
    Issued(u16),
    Acked(u16),
    Lost(String),
}

struct Session {
    client: AsyncClient,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    driver: JoinHandle<()>,
    /// Publish requests handed to the event loop and not yet on the wire
    queued: usize,
}

impl Session {
    /// The driver exits once the event loop fails
    fn is_alive(&self) -> bool {
        !self.driver.is_finished()
    }

    /// Count one outgoing publish; true when it belongs to the newest request
    fn on_issued(&mut self) -> bool {
        self.queued = self.queued.saturating_sub(1);
        self.queued == 0
    }

    /// Consume events left behind by abandoned attempts
    fn drain_stale(&mut self) -> Result<(), CloudError> {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Issued(pkid)) => {
                    self.on_issued();
                    log::debug!("Discarding stale publish {}", pkid);
                }
                Ok(SessionEvent::Lost(reason)) => return Err(CloudError::Disconnected(reason)),
                Ok(_) => {}
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    return Err(CloudError::Disconnected("event loop stopped".to_string()))
                }
            }
        }
    }

    /// Send one publish and wait for the PubAck of that packet
    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), CloudError> {
        self.drain_stale()?;

        if let Err(e) = self
            .client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
        {
            return Err(if self.is_alive() {
                CloudError::Client(e.to_string())
            } else {
                CloudError::Disconnected(e.to_string())
            });
        }
        self.queued += 1;

        // Requests reach the wire in order, so the last Issued is ours
        let mut awaiting = None;
        loop {
            match self.events.recv().await {
                Some(SessionEvent::Issued(pkid)) => {
                    if self.on_issued() {
                        awaiting = Some(pkid);
                    }
                }
                Some(SessionEvent::Acked(pkid)) if awaiting == Some(pkid) => return Ok(()),
                Some(SessionEvent::Acked(pkid)) => {
                    log::debug!("Ignoring stale PubAck {}", pkid);
                }
                Some(SessionEvent::Connected) => {}
                Some(SessionEvent::Lost(reason)) => return Err(CloudError::Disconnected(reason)),
                None => return Err(CloudError::Disconnected("event loop stopped".to_string())),
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

pub struct MqttTransport {
    options: MqttOptions,
    session: Option<Session>,
}

impl MqttTransport {
    pub fn new(config: &PublisherConfig) -> Result<Self, CloudError> {
        let mut options = MqttOptions::new(&config.client_id, &config.endpoint, config.port);
        options.set_keep_alive(config.keep_alive);
        options.set_clean_session(false);

        if let Some((ca, cert, key)) = config.tls_files() {
            let tls = TlsConfiguration::Simple {
                ca: read_tls_file(ca)?,
                alpn: None,
                client_auth: Some((read_tls_file(cert)?, read_tls_file(key)?)),
            };
            options.set_transport(Transport::tls_with_config(tls));
            log::info!("Broker transport: mutual TLS to {}:{}", config.endpoint, config.port);
        } else {
            log::warn!(
                "Broker transport: plain TCP to {}:{} (no certificates configured)",
                config.endpoint,
                config.port
            );
        }

        Ok(Self {
            options,
            session: None,
        })
    }

    fn drop_session(&mut self, reason: &str) {
        if self.session.take().is_some() {
            log::warn!("Broker session dropped: {}", reason);
        }
    }
}

fn read_tls_file(path: &PathBuf) -> Result<Vec<u8>, CloudError> {
    std::fs::read(path).map_err(|e| CloudError::Tls {
        path: path.clone(),
        message: e.to_string(),
    })
}

/// Poll the event loop until it fails or the session is dropped
async fn drive(mut eventloop: EventLoop, tx: mpsc::UnboundedSender<SessionEvent>) {
    loop {
        let event = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    SessionEvent::Connected
                } else {
                    SessionEvent::Lost(format!("{:?}", ack.code))
                }
            }
            Ok(Event::Incoming(Packet::PubAck(ack))) => SessionEvent::Acked(ack.pkid),
            Ok(Event::Outgoing(Outgoing::Publish(pkid))) => SessionEvent::Issued(pkid),
            Ok(other) => {
                log::trace!("mqtt event: {:?}", other);
                continue;
            }
            Err(e) => SessionEvent::Lost(e.to_string()),
        };

        let terminal = matches!(event, SessionEvent::Lost(_));
        if tx.send(event).is_err() || terminal {
            break;
        }
    }
}

#[async_trait]
impl BrokerTransport for MqttTransport {
    async fn connect(&mut self) -> Result<(), CloudError> {
        self.session = None;

        let (client, eventloop) = AsyncClient::new(self.options.clone(), REQUEST_CAPACITY);
        let (tx, rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(drive(eventloop, tx));
        let mut session = Session {
            client,
            events: rx,
            driver,
            queued: 0,
        };

        loop {
            match session.events.recv().await {
                Some(SessionEvent::Connected) => break,
                Some(SessionEvent::Lost(reason)) => return Err(CloudError::ConnectionRefused(reason)),
                Some(_) => continue,
                None => return Err(CloudError::ConnectionRefused("event loop stopped".to_string())),
            }
        }

        let (host, port) = self.options.broker_address();
        log::info!("Connected to broker {}:{}", host, port);
        self.session = Some(session);
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), CloudError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| CloudError::Disconnected("not connected".to_string()))?;

        let outcome = session.publish(topic, payload).await;
        if let Err(CloudError::Disconnected(reason)) = &outcome {
            let reason = reason.clone();
            self.drop_session(&reason);
        }
        outcome
    }

    async fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.client.disconnect().await {
                log::debug!("Broker disconnect request failed: {}", e);
            }
            // Let the driver flush DISCONNECT before it is aborted
            let _ = tokio::time::timeout(DISCONNECT_GRACE, &mut session.driver).await;
            log::info!("Disconnected from broker");
        }
    }

    fn is_connected(&self) -> bool {
        self.session.as_ref().map_or(false, Session::is_alive)
    }
}
