//! Cloud Sync Module - Alert delivery to the remote broker
//!
//! This module handles:
//! - The persistent MQTT session (`client`)
//! - At-least-once publish with bounded retry (`publisher`)
//! - The retry schedule (`backoff`)

pub mod backoff;
pub mod client;
pub mod publisher;

pub use backoff::RetryPolicy;
pub use client::{BrokerTransport, MqttTransport, PublisherConfig};
pub use publisher::{CloudPublisher, DeliveryOutcome};
