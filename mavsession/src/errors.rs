//! # Errors
//!
//! Everything that can go wrong in this library is local and recoverable: malformed frames are
//! dropped by the reassembler, unknown messages are values, and only explicit operations like
//! sending bytes or encoding a message return errors.

use std::sync::PoisonError;

use crate::protocol::MessageId;
use crate::session::TransportId;

/// Common result type returned by library functions.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors generated by the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failed to deliver outgoing bytes.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Payload of a validated frame does not match message schema.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Message can't be encoded into a frame.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// No session is registered for the transport.
    #[error("no session is registered for transport {0}")]
    UnknownTransport(TransportId),

    /// I/O error raised while reading incoming bytes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shared session state was poisoned by a panicking callback.
    #[error("session lock is poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::Poisoned
    }
}

/// Errors reported by a [`Transport`](crate::io::Transport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Underlying device or stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport is closed and no longer accepts data.
    #[error("transport is closed")]
    Closed,

    /// Transport rejected data for implementation-specific reasons.
    #[error("transport rejected data: {0}")]
    Rejected(String),
}

/// Errors raised while decoding a frame payload.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Payload length differs from the one declared by message schema.
    #[error("message #{message_id} expects {expected} payload bytes, got {actual}")]
    InvalidPayloadLength {
        /// Message `ID`.
        message_id: MessageId,
        /// Length declared by schema.
        expected: usize,
        /// Length of the received payload.
        actual: usize,
    },
}

/// Errors raised while encoding a message into a frame.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// Message `CRC_EXTRA` is unknown and frame checksum can't be calculated.
    #[error("CRC_EXTRA is not known for message #{0}")]
    UnknownCrcExtra(MessageId),

    /// Payload does not fit into a `MAVLink 1` frame.
    #[error("payload of {0} bytes exceeds maximum frame payload")]
    PayloadTooLong(usize),
}
