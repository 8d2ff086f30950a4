//! Alert Publisher
//!
//! Delivers one [`AlertRecord`] per call, at least once. Every attempt is
//! bounded by a timeout; a lost session is re-established before the next
//! attempt. When the budget runs out the failure is returned, never dropped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{sleep, timeout};

use super::backoff::RetryPolicy;
use super::client::{BrokerTransport, CloudError, PublisherConfig};
use crate::logic::alert::AlertRecord;

// ============================================================================
// OUTCOME & STATUS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Failed { attempts: u32, error: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts } | DeliveryOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Read-only view of the broker connection
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublisherStatus {
    pub connected: bool,
    pub delivered_count: u64,
    pub failed_count: u64,
    pub reconnect_count: u64,
    pub last_delivery: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

// ============================================================================
// PUBLISHER
// ============================================================================

pub struct CloudPublisher<B: BrokerTransport> {
    transport: B,
    topic: String,
    policy: RetryPolicy,
    connect_timeout: Duration,
    publish_timeout: Duration,
    status: PublisherStatus,
}

impl<B: BrokerTransport> CloudPublisher<B> {
    pub fn new(transport: B, config: &PublisherConfig, policy: RetryPolicy) -> Self {
        Self {
            transport,
            topic: config.topic.clone(),
            policy,
            connect_timeout: config.connect_timeout,
            publish_timeout: config.publish_timeout,
            status: PublisherStatus::default(),
        }
    }

    pub fn status(&self) -> &PublisherStatus {
        &self.status
    }

    #[cfg(test)]
    pub fn transport(&self) -> &B {
        &self.transport
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Startup connect; the caller treats failure as fatal
    pub async fn connect_initial(&mut self) -> Result<(), CloudError> {
        let result = self.connect_bounded().await;
        self.status.connected = self.transport.is_connected();
        if let Err(e) = &result {
            self.status.last_error = Some(e.to_string());
        }
        result
    }

    async fn connect_bounded(&mut self) -> Result<(), CloudError> {
        timeout(self.connect_timeout, self.transport.connect())
            .await
            .map_err(|_| CloudError::timeout("connect", self.connect_timeout))?
    }

    async fn attempt(&mut self, payload: Vec<u8>) -> Result<(), CloudError> {
        if !self.transport.is_connected() {
            log::info!("Reconnecting to broker...");
            self.connect_bounded().await?;
            self.status.reconnect_count += 1;
        }

        timeout(self.publish_timeout, self.transport.publish(&self.topic, payload))
            .await
            .map_err(|_| CloudError::timeout("publish", self.publish_timeout))?
    }

    /// Publish with retry; returns once delivered or the budget is spent
    pub async fn publish(&mut self, record: &AlertRecord) -> DeliveryOutcome {
        let payload = match record.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                let error = CloudError::from(e).to_string();
                log::error!("Alert for employee {} not publishable: {}", record.employee_id, error);
                return self.record_failure(0, error);
            }
        };

        let mut last_error = String::from("no publish attempts configured");
        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(payload.clone()).await {
                Ok(()) => {
                    self.status.connected = true;
                    self.status.delivered_count += 1;
                    self.status.last_delivery = Some(Utc::now());
                    if attempt > 1 {
                        log::info!(
                            "Alert for employee {} delivered after {} attempts",
                            record.employee_id,
                            attempt
                        );
                    } else {
                        log::debug!("Alert for employee {} delivered", record.employee_id);
                    }
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Err(e) => {
                    self.status.connected = self.transport.is_connected();
                    log::warn!(
                        "Publish attempt {}/{} for employee {} failed: {}",
                        attempt,
                        self.policy.max_attempts,
                        record.employee_id,
                        e
                    );
                    last_error = e.to_string();
                    self.status.last_error = Some(last_error.clone());

                    if self.policy.has_attempts_left(attempt) {
                        sleep(self.policy.delay_for(attempt)).await;
                    }
                }
            }
        }

        log::error!(
            "Alert for employee {} ({}) not delivered after {} attempts: {}",
            record.employee_id,
            record.status,
            self.policy.max_attempts,
            last_error
        );
        self.record_failure(self.policy.max_attempts, last_error)
    }

    fn record_failure(&mut self, attempts: u32, error: String) -> DeliveryOutcome {
        self.status.failed_count += 1;
        self.status.last_error = Some(error.clone());
        DeliveryOutcome::Failed { attempts, error }
    }

    pub async fn shutdown(&mut self) {
        self.transport.disconnect().await;
        self.status.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::alert::compose;
    use crate::logic::frame::parse;
    use crate::logic::model::FatigueLabel;
    use crate::logic::testing::{fast_publisher_config, fast_retry_policy, FakeTransport, Step};

    fn record() -> AlertRecord {
        let frame = parse("EMP:5,HR:70,SLEEP:8,STEPS:100,MOOD:4,TEMP:25,HUM:40,DIST:100,IR:0");
        compose(5, FatigueLabel::Rested, &[], &frame)
    }

    fn publisher(transport: FakeTransport, attempts: u32) -> CloudPublisher<FakeTransport> {
        CloudPublisher::new(transport, &fast_publisher_config(), fast_retry_policy(attempts))
    }

    #[tokio::test]
    async fn test_first_attempt_delivery() {
        let mut publisher = publisher(FakeTransport::connected(), 3);
        let outcome = publisher.publish(&record()).await;

        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 1 });
        assert_eq!(publisher.transport().delivered().len(), 1);
        assert_eq!(publisher.transport().delivered()[0].0, "safety/alerts");
        assert_eq!(publisher.status().delivered_count, 1);
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let transport = FakeTransport::connected().script([Step::Fail, Step::Disconnect]);
        let mut publisher = publisher(transport, 5);

        let outcome = publisher.publish(&record()).await;

        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 3 });
        // Delivered once from the caller's point of view
        assert_eq!(publisher.transport().delivered().len(), 1);
        assert_eq!(publisher.status().delivered_count, 1);
        assert_eq!(publisher.status().reconnect_count, 1);
        assert_eq!(publisher.transport().connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let transport = FakeTransport::connected().script([Step::Hang]);
        let mut publisher = publisher(transport, 2);

        let outcome = publisher.publish(&record()).await;

        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 2 });
        let last_error = publisher.status().last_error.clone().unwrap();
        assert!(last_error.contains("timed out"), "{}", last_error);
    }

    #[tokio::test]
    async fn test_budget_exhausted_reports_failure() {
        let transport = FakeTransport::connected().script([Step::Fail, Step::Fail, Step::Fail]);
        let mut publisher = publisher(transport, 3);

        let outcome = publisher.publish(&record()).await;

        assert!(!outcome.is_delivered());
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(publisher.status().failed_count, 1);
        assert!(publisher.transport().delivered().is_empty());

        // The next record goes through normally
        let outcome = publisher.publish(&record()).await;
        assert!(outcome.is_delivered());
    }

    #[tokio::test]
    async fn test_reconnect_failure_consumes_attempt() {
        let transport = FakeTransport::disconnected().failing_connects(2);
        let mut publisher = publisher(transport, 3);

        let outcome = publisher.publish(&record()).await;

        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 3 });
        assert_eq!(publisher.transport().connect_calls(), 3);
        assert_eq!(publisher.status().reconnect_count, 1);
    }

    #[tokio::test]
    async fn test_initial_connect_failure_is_returned() {
        let transport = FakeTransport::disconnected().failing_connects(1);
        let mut publisher = publisher(transport, 3);

        assert!(publisher.connect_initial().await.is_err());
        assert!(!publisher.status().connected);
        assert!(publisher.connect_initial().await.is_ok());
        assert!(publisher.status().connected);
    }

    #[tokio::test]
    async fn test_shutdown_disconnects() {
        let mut publisher = publisher(FakeTransport::connected(), 1);
        publisher.shutdown().await;
        assert!(!publisher.transport().is_connected());
        assert!(!publisher.status().connected);
    }
}
