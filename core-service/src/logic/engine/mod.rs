//! Engine Loop
//!
//! Reads one line at a time from the device link and carries it through
//! parse → extract → classify + evaluate → compose → actuate → publish
//! before reading the next. Per-frame failures end in a [`FrameOutcome`],
//! never in an error from [`SafetyEngine::run`].

use std::future::Future;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::logic::alert::{compose, AlertRecord};
use crate::logic::cloud_sync::{BrokerTransport, CloudPublisher, DeliveryOutcome};
use crate::logic::device::{DeviceLink, LinkError};
use crate::logic::features::FeatureExtractor;
use crate::logic::frame::{self, FieldError, TelemetryFrame};
use crate::logic::hazard::{self, HazardThresholds};
use crate::logic::model::{FatigueClassifier, InferenceError};
use crate::logic::response::{actuate, ActuationResult};
use crate::logic::telemetry::{EngineEvent, Recorder};


/// Consecutive non-terminal read failures before the link is given up
const MAX_READ_FAILURES: u32 = 5;

const READ_RETRY_DELAY: Duration = Duration::from_millis(100);

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

// ============================================================================
// OUTCOMES & STATS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Idle,
    Processing,
}

/// What became of one inbound line
#[derive(Debug)]
pub enum FrameOutcome {
    /// Blank or no `key:value` tokens
    Ignored,
    /// No employee id; nothing else happened
    Discarded,
    /// Malformed frame or classifier failure; no actuation, no publish
    Skipped {
        employee_id: Option<i64>,
        reason: EngineError,
    },
    Processed {
        record: AlertRecord,
        actuation: ActuationResult,
        delivery: DeliveryOutcome,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub lines_read: u64,
    pub ignored: u64,
    pub discarded: u64,
    pub skipped: u64,
    pub alerts_composed: u64,
    pub hazardous_alerts: u64,
    pub actuation_failures: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct SafetyEngine<B: BrokerTransport> {
    link: Box<dyn DeviceLink>,
    classifier: FatigueClassifier,
    thresholds: HazardThresholds,
    publisher: CloudPublisher<B>,
    journal: Option<Recorder>,
    state: EngineState,
    stats: EngineStats,
    started_at: Instant,
}

impl<B: BrokerTransport> SafetyEngine<B> {
    /// Takes ownership of already-opened connections
    pub fn new(
        link: Box<dyn DeviceLink>,
        classifier: FatigueClassifier,
        thresholds: HazardThresholds,
        publisher: CloudPublisher<B>,
        journal: Option<Recorder>,
    ) -> Self {
        Self {
            link,
            classifier,
            thresholds,
            publisher,
            journal,
            state: EngineState::Idle,
            stats: EngineStats::default(),
            started_at: Instant::now(),
        }
    }

    fn journal(&mut self, event: EngineEvent) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record_logged(&event);
        }
    }

    /// Run until the link closes or `shutdown` resolves
    ///
    /// A frame already being processed is finished first. Connections are
    /// released on every exit path. Transient read errors are retried after a
    /// pause; a run of [`MAX_READ_FAILURES`] of them fails the loop.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<EngineStats, EngineError>
    where
        F: Future<Output = ()>,
    {
        log::info!("Safety engine loop started");
        self.journal(EngineEvent::system_start(env!("CARGO_PKG_VERSION")));

        tokio::pin!(shutdown);

        let mut read_failures = 0u32;
        let result = loop {
            let read = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    log::info!("Shutdown requested");
                    break Ok(());
                }
                read = self.link.read_line() => read,
            };

            match read {
                Ok(Some(line)) => {
                    read_failures = 0;
                    self.process_line(&line).await;
                }
                Ok(None) => read_failures = 0,
                Err(LinkError::Closed) => {
                    log::info!("Device link closed");
                    break Ok(());
                }
                Err(e) if e.is_terminal() => {
                    log::error!("Device link failed: {}", e);
                    break Err(EngineError::Link(e));
                }
                Err(e) => {
                    read_failures += 1;
                    if read_failures >= MAX_READ_FAILURES {
                        log::error!("Device link failed {} reads in a row: {}", read_failures, e);
                        break Err(EngineError::Link(e));
                    }
                    log::warn!(
                        "Device link read failed ({}/{}): {}",
                        read_failures,
                        MAX_READ_FAILURES,
                        e
                    );

                    tokio::select! {
                        biased;
                        _ = &mut shutdown => {
                            log::info!("Shutdown requested");
                            break Ok(());
                        }
                        _ = tokio::time::sleep(READ_RETRY_DELAY) => {}
                    }
                }
            }
        };

        self.shutdown().await;
        result.map(|()| self.stats.clone())
    }

    /// Carry one inbound line through the pipeline
    pub async fn process_line(&mut self, line: &str) -> FrameOutcome {
        self.state = EngineState::Processing;
        self.stats.lines_read += 1;
        let outcome = self.handle_line(line).await;
        self.account(&outcome);
        self.state = EngineState::Idle;
        outcome
    }

    /// Count and journal a finished frame
    fn account(&mut self, outcome: &FrameOutcome) {
        match outcome {
            FrameOutcome::Ignored => self.stats.ignored += 1,
            FrameOutcome::Discarded => self.stats.discarded += 1,
            FrameOutcome::Skipped { employee_id, reason } => {
                self.stats.skipped += 1;
                self.journal(EngineEvent::frame_skipped(*employee_id, &reason.to_string()));
            }
            FrameOutcome::Processed {
                record,
                actuation,
                delivery,
            } => {
                self.stats.alerts_composed += 1;
                if !record.is_safe() {
                    self.stats.hazardous_alerts += 1;
                }
                self.journal(EngineEvent::alert_composed(record));

                if !actuation.is_success() {
                    self.stats.actuation_failures += 1;
                    self.journal(EngineEvent::actuation_failed(
                        record.employee_id,
                        actuation.command.as_str(),
                        &actuation.message,
                    ));
                }

                match delivery {
                    DeliveryOutcome::Delivered { attempts } => {
                        self.stats.delivered += 1;
                        self.journal(EngineEvent::alert_delivered(record, *attempts));
                    }
                    DeliveryOutcome::Failed { attempts, error } => {
                        self.stats.delivery_failures += 1;
                        self.journal(EngineEvent::delivery_failed(record, *attempts, error));
                    }
                }
            }
        }
    }

    async fn handle_line(&mut self, line: &str) -> FrameOutcome {
        let frame = frame::parse(line);
        if frame.is_empty() {
            log::debug!("Ignoring line without fields: {:?}", line);
            return FrameOutcome::Ignored;
        }

        let employee_id = match frame.employee_id() {
            Ok(id) => id,
            Err(FieldError::Missing(_)) => {
                log::debug!("Discarding frame without employee id: {:?}", line);
                return FrameOutcome::Discarded;
            }
            Err(e) => return self.skip(None, e.into()),
        };

        let record = match self.assess(employee_id, &frame) {
            Ok(record) => record,
            Err(e) => return self.skip(Some(employee_id), e),
        };

        log::info!("[EMP {}] {} => {}", employee_id, frame.sensor_summary(), record.status);

        // Actuation is never gated on publish success
        let actuation = actuate(&mut *self.link, &record.status).await;
        let delivery = self.publisher.publish(&record).await;
        log::debug!(
            "[EMP {}] {} after {} attempt(s)",
            employee_id,
            if delivery.is_delivered() { "delivered" } else { "not delivered" },
            delivery.attempts()
        );

        FrameOutcome::Processed {
            record,
            actuation,
            delivery,
        }
    }

    fn assess(&self, employee_id: i64, frame: &TelemetryFrame) -> Result<AlertRecord, EngineError> {
        let features = FeatureExtractor::extract(frame)?;
        log::debug!("[EMP {}] features {}", employee_id, features.to_log_entry());
        let hazards = hazard::evaluate(frame, &self.thresholds)?;
        let fatigue = self.classifier.classify(&features)?;
        Ok(compose(employee_id, fatigue, &hazards, frame))
    }

    fn skip(&self, employee_id: Option<i64>, reason: EngineError) -> FrameOutcome {
        match employee_id {
            Some(id) => log::warn!("Skipping frame for employee {}: {}", id, reason),
            None => log::warn!("Skipping frame: {}", reason),
        }
        FrameOutcome::Skipped {
            employee_id,
            reason,
        }
    }

    async fn shutdown(&mut self) {
        debug_assert_eq!(self.state, EngineState::Idle, "shutdown with a frame in flight");
        self.link.close().await;
        self.publisher.shutdown().await;

        let uptime = self.started_at.elapsed().as_secs();
        let stats = serde_json::to_value(&self.stats).unwrap_or_default();
        self.journal(EngineEvent::system_stop(uptime, stats));
        if let Some(journal) = self.journal.as_mut() {
            journal.flush();
        }

        log::info!(
            "Safety engine stopped: {} lines, {} alerts ({} hazardous), {} delivered, {} delivery failures, {} skipped, {} discarded",
            self.stats.lines_read,
            self.stats.alerts_composed,
            self.stats.hazardous_alerts,
            self.stats.delivered,
            self.stats.delivery_failures,
            self.stats.skipped,
            self.stats.discarded
        );
        let broker = self.publisher.status();
        log::info!(
            "Broker: {} delivered, {} failed, {} reconnects",
            broker.delivered_count,
            broker.failed_count,
            broker.reconnect_count
        );
    }
}
