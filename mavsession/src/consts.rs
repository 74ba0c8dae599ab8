//! # Common constants

use std::time::Duration;

/// `MAVLink 1` start-of-frame marker.
pub const STX_V1: u8 = 0xFE;

/// Size of a `MAVLink 1` header including the start marker.
pub const HEADER_SIZE: usize = 6;

/// Size of the frame checksum.
pub const CHECKSUM_SIZE: usize = 2;

/// Maximum payload length a `MAVLink 1` frame can declare.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Maximum size of a complete `MAVLink 1` frame.
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + CHECKSUM_SIZE;

/// Default system `ID` used for outgoing frames (ground control station range).
pub const DEFAULT_SYSTEM_ID: u8 = 255;

/// Default component `ID` used for outgoing frames.
pub const DEFAULT_COMPONENT_ID: u8 = 190;

/// Nominal interval at which a live peer emits heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1000);

/// Default heartbeat timeout: three missed heartbeat intervals.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Default interval between liveness checks performed by runners.
pub const DEFAULT_LIVENESS_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Default number of consecutive fed chunks after which an incomplete frame is dropped.
///
/// Large enough for the longest frame to complete when fed one byte at a time.
pub const DEFAULT_MAX_STALLED_CHUNKS: usize = MAX_FRAME_SIZE;

/// Size of the read buffer used by runners.
#[cfg(any(feature = "sync", feature = "async"))]
pub(crate) const READ_BUFFER_SIZE: usize = 1024;

/// Capacity of the event broadcast channel of the asynchronous driver.
#[cfg(feature = "async")]
pub(crate) const EVENTS_CHANNEL_CAPACITY: usize = 1024;
