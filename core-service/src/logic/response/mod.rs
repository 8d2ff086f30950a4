//! Response Module - Worker-side actuation
//!
//! # Components
//! - `types.rs`: Actuation commands and results
//! - `actuator.rs`: Writes the command token to the device link

pub mod types;
pub mod actuator;

pub use types::ActuationResult;
pub use actuator::actuate;
