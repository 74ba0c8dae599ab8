//! Test utils.
//!
//! These utils are generated only when `#[cfg(test)]` enabled.

use std::sync::{Arc, Mutex, Once};

use crate::errors::TransportError;
use crate::io::Transport;
use crate::protocol::{DecodedMessage, Frame, Heartbeat, MessageTable, Sequence};

static INIT_LOGGER: Once = Once::new();
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Trace;

pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::builder()
            // Suppress everything below `warn` for third-party modules
            .filter_level(log::LevelFilter::Warn)
            // Allow everything above `LOG_LEVEL` from current package
            .filter_module(env!("CARGO_PKG_NAME"), LOG_LEVEL)
            .is_test(true)
            .init();
    });
}

pub fn heartbeat() -> Heartbeat {
    Heartbeat {
        type_: 1,
        autopilot: 3,
        base_mode: 81,
        custom_mode: 0,
        system_status: 4,
        mavlink_version: 3,
    }
}

pub fn heartbeat_bytes(sequence: Sequence) -> Vec<u8> {
    Frame::from_message(
        sequence,
        1,
        1,
        &DecodedMessage::from(heartbeat()),
        &MessageTable::new(),
    )
    .unwrap()
    .to_bytes()
}

/// Transport that keeps every sent chunk.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        self.sent.clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }
}

/// Transport that is always closed.
#[derive(Copy, Clone, Debug)]
pub struct FailingTransport;

impl Transport for FailingTransport {
    fn send(&mut self, _: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::Closed)
    }
}
