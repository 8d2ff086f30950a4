//! Hazard Module
//!
//! Deterministic threshold rules applied to every telemetry frame.
//!
//! ## Structure
//! - `types`: HazardLabel and its canonical ordering
//! - `rules`: Thresholds and constants
//! - `evaluator`: Rule evaluation
//!
//! ## Usage
//! ```ignore
//! use crate::logic::hazard::{evaluate, HazardThresholds};
//!
//! let hazards = evaluate(&frame, &HazardThresholds::default())?;
//! ```

pub mod types;
pub mod rules;
pub mod evaluator;

pub use types::HazardLabel;
pub use rules::HazardThresholds;
pub use evaluator::evaluate;
