//! Serial Device Link
//!
//! USB-serial gateway at 115200 8N1 by default. The port handle is blocking,
//! so every read and write runs on the blocking pool against a shared
//! handle; the async caller never blocks the runtime.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use super::{decode_line, DeviceLink, LinkError};
use crate::constants;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl LinkConfig {
    pub fn from_env() -> Self {
        Self {
            port: constants::get_serial_port(),
            baud_rate: constants::get_baud_rate(),
            read_timeout: Duration::from_millis(constants::get_read_timeout_ms()),
        }
    }
}

// ============================================================================
// SERIAL LINK
// ============================================================================

struct PortState {
    reader: BufReader<Box<dyn SerialPort>>,
    /// Bytes of a line whose terminator has not arrived yet
    pending: Vec<u8>,
}

pub struct SerialLink {
    port_name: String,
    state: Arc<Mutex<Option<PortState>>>,
}

impl SerialLink {
    /// Open the port; failure here is a fatal startup error
    pub fn open(config: &LinkConfig) -> Result<Self, LinkError> {
        log::info!(
            "Opening device link {} at {} baud",
            config.port,
            config.baud_rate
        );

        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| LinkError::Open {
                port: config.port.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            port_name: config.port.clone(),
            state: Arc::new(Mutex::new(Some(PortState {
                reader: BufReader::new(port),
                pending: Vec::with_capacity(256),
            }))),
        })
    }
}

fn read_line_blocking(state: &Mutex<Option<PortState>>) -> Result<Option<String>, LinkError> {
    let mut guard = state.lock();
    let port = guard.as_mut().ok_or(LinkError::Closed)?;

    match port.reader.read_until(b'\n', &mut port.pending) {
        Ok(0) => {
            if port.pending.is_empty() {
                Err(LinkError::Closed)
            } else {
                let line = decode_line(&port.pending);
                port.pending.clear();
                Ok(Some(line))
            }
        }
        Ok(_) => {
            if port.pending.last() != Some(&b'\n') {
                // EOF mid-line; keep the fragment for the next read
                return Ok(None);
            }
            let line = decode_line(&port.pending);
            port.pending.clear();
            Ok(Some(line))
        }
        Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(None),
        Err(e) if e.kind() == ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(LinkError::Io(e)),
    }
}

fn write_blocking(state: &Mutex<Option<PortState>>, token: &[u8]) -> Result<(), LinkError> {
    let mut guard = state.lock();
    let port = guard.as_mut().ok_or(LinkError::Closed)?;
    let writer = port.reader.get_mut();
    writer.write_all(token)?;
    writer.flush()?;
    Ok(())
}

#[async_trait]
impl DeviceLink for SerialLink {
    async fn read_line(&mut self) -> Result<Option<String>, LinkError> {
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || read_line_blocking(&state))
            .await
            .map_err(|e| LinkError::Worker(e.to_string()))?
    }

    async fn write_token(&mut self, token: &[u8]) -> Result<(), LinkError> {
        let state = Arc::clone(&self.state);
        let token = token.to_vec();
        tokio::task::spawn_blocking(move || write_blocking(&state, &token))
            .await
            .map_err(|e| LinkError::Worker(e.to_string()))?
    }

    async fn close(&mut self) {
        if self.state.lock().take().is_some() {
            log::info!("Device link {} closed", self.port_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port_fails() {
        let config = LinkConfig {
            port: "/definitely/not/a/serial/port".to_string(),
            baud_rate: 115_200,
            read_timeout: Duration::from_millis(10),
        };
        match SerialLink::open(&config) {
            Err(LinkError::Open { port, .. }) => assert_eq!(port, config.port),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("open should fail"),
        }
    }

    #[test]
    fn test_closed_state_reports_closed() {
        let state = Mutex::new(None);
        assert!(matches!(read_line_blocking(&state), Err(LinkError::Closed)));
        assert!(matches!(write_blocking(&state, b"SAFE"), Err(LinkError::Closed)));
    }
}
