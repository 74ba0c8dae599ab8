//! # MAVLink protocol entities
//!
//! This module implements `MAVLink 1` framing: [`FrameReassembler`] turns a raw byte stream into
//! checksum-validated [`Frame`]s, and [`MessageDecoder`] turns frames into [`DecodedMessage`]s
//! according to a [`MessageTable`].
//!
//! `MAVLink 1` frames start with `0xFE` and carry a 6-byte header. Checksum is CRC-16/MCRF4XX
//! over the header (without the start marker) and payload, seeded with a per-message
//! `CRC_EXTRA`.

mod crc;
mod frame;
mod message;
mod reassembler;
mod schema;

pub use crc::{checksum, Crc, CRC_INIT};
pub use frame::Frame;
pub use message::{
    CommandAck, DecodedMessage, Heartbeat, MessageDecoder, StatusText,
    MAV_MODE_FLAG_SAFETY_ARMED,
};
pub use reassembler::{FrameReassembler, Frames, ReassemblerNotice, ReassemblerStats};
pub use schema::{Field, FieldKind, MessageSchema, MessageTable};

/// MAVLink system `ID`.
pub type SystemId = u8;

/// MAVLink component `ID`.
pub type ComponentId = u8;

/// `MAVLink 1` message `ID`.
pub type MessageId = u8;

/// Packet sequence number.
pub type Sequence = u8;
