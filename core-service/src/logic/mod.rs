//! Logic Module - Safety pipeline
//!
//! ## Pipeline
//! - `frame` - Device line parser
//! - `features` - Classifier input extraction
//! - `model` - Fatigue classifier (ONNX)
//! - `hazard` - Threshold rules
//! - `alert` - Status composition
//! - `response` - Actuation back to the wearable
//! - `cloud_sync` - Broker delivery
//! - `engine` - The loop tying it together
//!
//! ## Support
//! - `device` - Serial link
//! - `telemetry` - Outcome journal
//! - `config` - Environment configuration

pub mod frame;
pub mod features;
pub mod model;
pub mod hazard;
pub mod alert;
pub mod response;
pub mod device;
pub mod cloud_sync;
pub mod telemetry;
pub mod engine;
pub mod config;

#[cfg(test)]
pub(crate) mod testing;
