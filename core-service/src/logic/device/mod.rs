//! Device Link Module
//!
//! Line-oriented, bidirectional byte link to the wearable gateway. Inbound:
//! one telemetry line per read. Outbound: bare actuation tokens.
//!
//! The engine only sees the [`DeviceLink`] trait; `serial` is the production
//! implementation.

pub mod serial;

use async_trait::async_trait;
use thiserror::Error;

pub use serial::{LinkConfig, SerialLink};

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to open device link {port}: {message}")]
    Open { port: String, message: String },

    #[error("device link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device link closed")]
    Closed,

    #[error("device link worker failed: {0}")]
    Worker(String),
}

impl LinkError {
    /// Errors after which no further reads can succeed
    pub fn is_terminal(&self) -> bool {
        match self {
            LinkError::Closed | LinkError::Open { .. } | LinkError::Worker(_) => true,
            LinkError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::PermissionDenied
            ),
        }
    }
}

// ============================================================================
// LINK TRAIT
// ============================================================================

#[async_trait]
pub trait DeviceLink: Send {
    /// Next decoded line without its terminator
    ///
    /// `Ok(None)` when the read timeout elapsed with no complete line.
    async fn read_line(&mut self) -> Result<Option<String>, LinkError>;

    /// Write a raw token, no framing, then flush
    async fn write_token(&mut self, token: &[u8]) -> Result<(), LinkError>;

    /// Release the link; later calls fail with `LinkError::Closed`
    async fn close(&mut self);
}

/// Lossy UTF-8 decode dropping invalid sequences and the line terminator
pub fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect::<String>()
        .trim_end_matches(&['\r', '\n'][..])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_drops_invalid_bytes() {
        let bytes = b"EMP:1,\xffHR:7\xfe0\r\n";
        assert_eq!(decode_line(bytes), "EMP:1,HR:70");
    }

    #[test]
    fn test_decode_plain_line() {
        assert_eq!(decode_line(b"EMP:3\n"), "EMP:3");
        assert_eq!(decode_line(b""), "");
    }

    #[test]
    fn test_terminal_errors() {
        assert!(LinkError::Closed.is_terminal());
        let timeout = std::io::Error::new(std::io::ErrorKind::TimedOut, "t");
        assert!(!LinkError::Io(timeout).is_terminal());
        let broken = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "b");
        assert!(LinkError::Io(broken).is_terminal());
    }
}
