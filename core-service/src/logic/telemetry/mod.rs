//! Telemetry Module
//!
//! Outcome journal for the engine: one JSONL line per lifecycle event and
//! per frame outcome. Owned by the engine, never global.
//!
//! ## Structure
//! - `event.rs` - EngineEvent struct (immutable, timestamped)
//! - `recorder.rs` - Append-only JSONL writer with size rotation
//!
//! ## Usage
//! ```ignore
//! use crate::logic::telemetry::{self, EngineEvent, JournalConfig};
//!
//! let mut journal = telemetry::open(&JournalConfig::from_env());
//! if let Some(recorder) = journal.as_mut() {
//!     recorder.record_logged(&EngineEvent::system_start(env!("CARGO_PKG_VERSION")));
//! }
//! ```

pub mod event;
pub mod recorder;

pub use event::EngineEvent;
pub use recorder::{open, JournalConfig, Recorder};
