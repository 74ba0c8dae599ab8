//! MAVLink frame.

use std::fmt::{Debug, Formatter};

use crate::consts::{CHECKSUM_SIZE, HEADER_SIZE, MAX_PAYLOAD_SIZE, STX_V1};
use crate::errors::EncodeError;
use crate::protocol::crc::checksum;
use crate::protocol::{ComponentId, DecodedMessage, MessageId, MessageTable, Sequence, SystemId};

/// A complete, checksum-validated `MAVLink 1` frame.
///
/// Frames are produced by [`FrameReassembler`](crate::protocol::FrameReassembler) from incoming
/// bytes or built from messages by [`Frame::from_message`]. The wire layout is:
///
/// | offset | size | field          |
/// |--------|------|----------------|
/// | 0      | 1    | magic (`0xFE`) |
/// | 1      | 1    | payload length |
/// | 2      | 1    | sequence       |
/// | 3      | 1    | system `ID`    |
/// | 4      | 1    | component `ID` |
/// | 5      | 1    | message `ID`   |
/// | 6      | N    | payload        |
/// | 6 + N  | 2    | checksum (LE)  |
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "FrameParts"))]
pub struct Frame {
    sequence: Sequence,
    system_id: SystemId,
    component_id: ComponentId,
    message_id: MessageId,
    payload: Vec<u8>,
    checksum: u16,
}

impl Frame {
    /// Builds a frame from its parts calculating the checksum with `crc_extra`.
    ///
    /// Fails if payload does not fit into a `MAVLink 1` frame.
    pub fn new(
        sequence: Sequence,
        system_id: SystemId,
        component_id: ComponentId,
        message_id: MessageId,
        payload: Vec<u8>,
        crc_extra: u8,
    ) -> Result<Self, EncodeError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(EncodeError::PayloadTooLong(payload.len()));
        }

        let mut frame = Self {
            sequence,
            system_id,
            component_id,
            message_id,
            payload,
            checksum: 0,
        };
        frame.checksum = frame.calculate_checksum(crc_extra);

        Ok(frame)
    }

    /// Encodes a message into a frame.
    ///
    /// `CRC_EXTRA` is looked up in the provided message `table`.
    pub fn from_message(
        sequence: Sequence,
        system_id: SystemId,
        component_id: ComponentId,
        message: &DecodedMessage,
        table: &MessageTable,
    ) -> Result<Self, EncodeError> {
        let message_id = message.message_id();
        let crc_extra = table
            .crc_extra(message_id)
            .ok_or(EncodeError::UnknownCrcExtra(message_id))?;

        Self::new(
            sequence,
            system_id,
            component_id,
            message_id,
            message.to_payload(),
            crc_extra,
        )
    }

    /// Parses a complete frame from `bytes` without validating the checksum.
    ///
    /// `bytes` must start with the magic byte and contain the whole frame. Returns [`None`]
    /// otherwise.
    pub(crate) fn parse_unchecked(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE + CHECKSUM_SIZE || bytes[0] != STX_V1 {
            return None;
        }

        let payload_length = bytes[1] as usize;
        let payload_end = HEADER_SIZE + payload_length;
        if bytes.len() < payload_end + CHECKSUM_SIZE {
            return None;
        }

        Some(Self {
            sequence: bytes[2],
            system_id: bytes[3],
            component_id: bytes[4],
            message_id: bytes[5],
            payload: bytes[HEADER_SIZE..payload_end].to_vec(),
            checksum: u16::from_le_bytes([bytes[payload_end], bytes[payload_end + 1]]),
        })
    }

    /// Packet sequence number.
    #[inline]
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// System `ID` of the sender.
    #[inline]
    pub fn system_id(&self) -> SystemId {
        self.system_id
    }

    /// Component `ID` of the sender.
    #[inline]
    pub fn component_id(&self) -> ComponentId {
        self.component_id
    }

    /// Message `ID`.
    #[inline]
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Payload length.
    #[inline]
    pub fn payload_length(&self) -> u8 {
        self.payload.len() as u8
    }

    /// Payload data.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Frame checksum as transmitted.
    #[inline]
    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Total size of the encoded frame.
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE
    }

    /// Calculates checksum over header (excluding magic byte) and payload seeded by `crc_extra`.
    pub fn calculate_checksum(&self, crc_extra: u8) -> u16 {
        let mut data = Vec::with_capacity(HEADER_SIZE - 1 + self.payload.len());
        data.extend_from_slice(&self.header_bytes()[1..]);
        data.extend_from_slice(&self.payload);
        checksum(&data, crc_extra)
    }

    /// Returns `true` if the transmitted checksum matches `crc_extra`.
    pub fn validate_checksum(&self, crc_extra: u8) -> bool {
        self.calculate_checksum(crc_extra) == self.checksum
    }

    /// Encodes frame into wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.extend_from_slice(&self.header_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes.extend_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    fn header_bytes(&self) -> [u8; HEADER_SIZE] {
        [
            STX_V1,
            self.payload.len() as u8,
            self.sequence,
            self.system_id,
            self.component_id,
            self.message_id,
        ]
    }
}

/// Serialized form of a [`Frame`] checked on deserialization.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct FrameParts {
    sequence: Sequence,
    system_id: SystemId,
    component_id: ComponentId,
    message_id: MessageId,
    payload: Vec<u8>,
    checksum: u16,
}

#[cfg(feature = "serde")]
impl TryFrom<FrameParts> for Frame {
    type Error = EncodeError;

    fn try_from(parts: FrameParts) -> Result<Self, Self::Error> {
        if parts.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(EncodeError::PayloadTooLong(parts.payload.len()));
        }

        Ok(Self {
            sequence: parts.sequence,
            system_id: parts.system_id,
            component_id: parts.component_id,
            message_id: parts.message_id,
            payload: parts.payload,
            checksum: parts.checksum,
        })
    }
}

impl Debug for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("system_id", &self.system_id)
            .field("component_id", &self.component_id)
            .field("message_id", &self.message_id)
            .field("payload_length", &self.payload.len())
            .field("checksum", &format_args!("{:#06x}", self.checksum))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Heartbeat;

    #[test]
    fn frame_layout() {
        let frame = Frame::new(7, 1, 2, 0, vec![0xAA; 9], 50).unwrap();
        let bytes = frame.to_bytes();

        assert_eq!(bytes.len(), 17);
        assert_eq!(&bytes[..6], &[STX_V1, 9, 7, 1, 2, 0]);
        assert_eq!(&bytes[6..15], &[0xAA; 9]);
        assert_eq!(
            u16::from_le_bytes([bytes[15], bytes[16]]),
            checksum(&bytes[1..15], 50)
        );
    }

    #[test]
    fn parse_unchecked_reads_all_fields() {
        let frame = Frame::new(200, 42, 17, 77, vec![1, 2, 3], 143).unwrap();
        let parsed = Frame::parse_unchecked(&frame.to_bytes()).unwrap();

        assert_eq!(parsed, frame);
        assert!(parsed.validate_checksum(143));
        assert!(!parsed.validate_checksum(144));
    }

    #[test]
    fn parse_unchecked_rejects_truncated_frames() {
        let bytes = Frame::new(0, 1, 1, 0, vec![0; 9], 50).unwrap().to_bytes();
        assert!(Frame::parse_unchecked(&bytes[..bytes.len() - 1]).is_none());
        assert!(Frame::parse_unchecked(&bytes[1..]).is_none());
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let err = Frame::new(0, 1, 1, 0, vec![0; 256], 50).unwrap_err();
        assert_eq!(err, EncodeError::PayloadTooLong(256));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialized_frames_respect_payload_limit() {
        let parts = |len: usize| FrameParts {
            sequence: 1,
            system_id: 2,
            component_id: 3,
            message_id: 4,
            payload: vec![0; len],
            checksum: 0x1234,
        };

        assert_eq!(
            Frame::try_from(parts(256)).unwrap_err(),
            EncodeError::PayloadTooLong(256)
        );

        let frame = Frame::try_from(parts(255)).unwrap();
        assert_eq!(frame.payload_length(), 255);
        assert_eq!(frame.checksum(), 0x1234);
        assert_eq!(frame.size(), 263);
    }

    #[test]
    fn from_message_requires_crc_extra() {
        let table = MessageTable::new();
        let unknown = DecodedMessage::Unknown {
            message_id: 222,
            payload: vec![1],
        };
        assert_eq!(
            Frame::from_message(0, 1, 1, &unknown, &table).unwrap_err(),
            EncodeError::UnknownCrcExtra(222)
        );

        let heartbeat = DecodedMessage::Heartbeat(Heartbeat::default());
        let frame = Frame::from_message(3, 1, 1, &heartbeat, &table).unwrap();
        assert_eq!(frame.payload_length(), 9);
        assert!(frame.validate_checksum(50));
    }
}
