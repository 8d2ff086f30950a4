//! Alert Module
//!
//! Turns classifier output and hazard labels into one immutable
//! [`AlertRecord`] per processed frame.

pub mod record;

pub use record::{compose, AlertRecord, SAFE_STATUS};
