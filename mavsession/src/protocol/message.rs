//! Decoded MAVLink messages and the message decoder.

use std::sync::Arc;

use crate::errors::DecodeError;
use crate::protocol::schema::{
    fields_size, PayloadReader, PayloadWriter, COMMAND_ACK_FIELDS, HEARTBEAT_FIELDS,
    STATUSTEXT_FIELDS,
};
use crate::protocol::{Frame, MessageId, MessageTable};

/// `MAV_MODE_FLAG_SAFETY_ARMED` bit of [`Heartbeat::base_mode`].
pub const MAV_MODE_FLAG_SAFETY_ARMED: u8 = 0b1000_0000;

const STATUSTEXT_LEN: usize = 50;

/// `HEARTBEAT` message (`#0`).
///
/// Enum-typed fields are kept as raw values: their meaning depends on the dialect the peer speaks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Heartbeat {
    /// Vehicle or component type (`MAV_TYPE`).
    pub type_: u8,
    /// Autopilot type (`MAV_AUTOPILOT`).
    pub autopilot: u8,
    /// System mode bitmap (`MAV_MODE_FLAG`).
    pub base_mode: u8,
    /// Autopilot-specific flags.
    pub custom_mode: u32,
    /// System status (`MAV_STATE`).
    pub system_status: u8,
    /// MAVLink version the peer speaks.
    pub mavlink_version: u8,
}

impl Heartbeat {
    /// Message `ID`.
    pub const ID: MessageId = 0;

    /// Returns `true` if the vehicle reports itself as armed.
    pub fn is_armed(&self) -> bool {
        self.base_mode & MAV_MODE_FLAG_SAFETY_ARMED != 0
    }

    pub(crate) fn decode(reader: &mut PayloadReader<'_>) -> DecodedMessage {
        let custom_mode = reader.u32();
        let type_ = reader.u8();
        let autopilot = reader.u8();
        let base_mode = reader.u8();
        let system_status = reader.u8();
        let mavlink_version = reader.u8();

        DecodedMessage::Heartbeat(Self {
            type_,
            autopilot,
            base_mode,
            custom_mode,
            system_status,
            mavlink_version,
        })
    }

    fn encode(&self) -> Vec<u8> {
        PayloadWriter::with_capacity(fields_size(HEARTBEAT_FIELDS))
            .u32(self.custom_mode)
            .u8(self.type_)
            .u8(self.autopilot)
            .u8(self.base_mode)
            .u8(self.system_status)
            .u8(self.mavlink_version)
            .finish()
    }
}

/// `COMMAND_ACK` message (`#77`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandAck {
    /// Acknowledged command (`MAV_CMD`).
    pub command: u16,
    /// Result (`MAV_RESULT`).
    pub result: u8,
}

impl CommandAck {
    /// Message `ID`.
    pub const ID: MessageId = 77;

    pub(crate) fn decode(reader: &mut PayloadReader<'_>) -> DecodedMessage {
        let command = reader.u16();
        let result = reader.u8();
        DecodedMessage::CommandAck(Self { command, result })
    }

    fn encode(&self) -> Vec<u8> {
        PayloadWriter::with_capacity(fields_size(COMMAND_ACK_FIELDS))
            .u16(self.command)
            .u8(self.result)
            .finish()
    }
}

/// `STATUSTEXT` message (`#253`).
///
/// Text is decoded up to the first `NUL`. Invalid UTF-8 sequences are replaced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusText {
    /// Severity (`MAV_SEVERITY`).
    pub severity: u8,
    /// Status text.
    pub text: String,
}

impl StatusText {
    /// Message `ID`.
    pub const ID: MessageId = 253;

    pub(crate) fn decode(reader: &mut PayloadReader<'_>) -> DecodedMessage {
        let severity = reader.u8();
        let raw = reader.chars::<STATUSTEXT_LEN>();
        let end = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
        let text = String::from_utf8_lossy(&raw[..end]).into_owned();

        DecodedMessage::StatusText(Self { severity, text })
    }

    fn encode(&self) -> Vec<u8> {
        let mut text = [0u8; STATUSTEXT_LEN];
        let bytes = self.text.as_bytes();
        let len = bytes.len().min(STATUSTEXT_LEN);
        text[..len].copy_from_slice(&bytes[..len]);

        PayloadWriter::with_capacity(fields_size(STATUSTEXT_FIELDS))
            .u8(self.severity)
            .chars(&text)
            .finish()
    }
}

/// Message decoded from a validated frame.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodedMessage {
    /// `HEARTBEAT`
    Heartbeat(Heartbeat),
    /// `COMMAND_ACK`
    CommandAck(CommandAck),
    /// `STATUSTEXT`
    StatusText(StatusText),
    /// Message without a typed schema.
    ///
    /// Unknown messages are expected on any real link and are not errors.
    Unknown {
        /// Message `ID`.
        message_id: MessageId,
        /// Raw payload.
        payload: Vec<u8>,
    },
}

impl DecodedMessage {
    /// Message `ID`.
    pub fn message_id(&self) -> MessageId {
        match self {
            DecodedMessage::Heartbeat(_) => Heartbeat::ID,
            DecodedMessage::CommandAck(_) => CommandAck::ID,
            DecodedMessage::StatusText(_) => StatusText::ID,
            DecodedMessage::Unknown { message_id, .. } => *message_id,
        }
    }

    /// Returns `true` for `HEARTBEAT`.
    #[inline]
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, DecodedMessage::Heartbeat(_))
    }

    /// Encodes message payload.
    pub fn to_payload(&self) -> Vec<u8> {
        match self {
            DecodedMessage::Heartbeat(msg) => msg.encode(),
            DecodedMessage::CommandAck(msg) => msg.encode(),
            DecodedMessage::StatusText(msg) => msg.encode(),
            DecodedMessage::Unknown { payload, .. } => payload.clone(),
        }
    }
}

impl From<Heartbeat> for DecodedMessage {
    fn from(value: Heartbeat) -> Self {
        DecodedMessage::Heartbeat(value)
    }
}

impl From<CommandAck> for DecodedMessage {
    fn from(value: CommandAck) -> Self {
        DecodedMessage::CommandAck(value)
    }
}

impl From<StatusText> for DecodedMessage {
    fn from(value: StatusText) -> Self {
        DecodedMessage::StatusText(value)
    }
}

/// Decodes validated frames into [`DecodedMessage`] values.
///
/// Decoding is pure: the decoder only reads its [`MessageTable`].
///
/// ```rust
/// use mavsession::protocol::{DecodedMessage, Frame, Heartbeat, MessageDecoder};
///
/// let decoder = MessageDecoder::default();
/// let heartbeat = DecodedMessage::from(Heartbeat { type_: 2, ..Default::default() });
/// let frame = Frame::from_message(0, 1, 1, &heartbeat, decoder.table()).unwrap();
///
/// assert_eq!(decoder.decode(&frame).unwrap(), heartbeat);
/// ```
#[derive(Clone, Debug)]
pub struct MessageDecoder {
    table: Arc<MessageTable>,
}

impl MessageDecoder {
    /// Creates a decoder over a shared message table.
    pub fn new(table: Arc<MessageTable>) -> Self {
        Self { table }
    }

    /// Message table used by this decoder.
    pub fn table(&self) -> &MessageTable {
        &self.table
    }

    /// Decodes a frame.
    ///
    /// Messages without a typed schema are returned as [`DecodedMessage::Unknown`]. A payload
    /// that does not match the schema length is a [`DecodeError::InvalidPayloadLength`].
    pub fn decode(&self, frame: &Frame) -> Result<DecodedMessage, DecodeError> {
        let message_id = frame.message_id();
        let payload = frame.payload();

        let schema = match self.table.schema(message_id) {
            Some(schema) if schema.is_typed() => schema,
            _ => {
                return Ok(DecodedMessage::Unknown {
                    message_id,
                    payload: payload.to_vec(),
                })
            }
        };

        let expected = schema.payload_length();
        if payload.len() != expected {
            return Err(DecodeError::InvalidPayloadLength {
                message_id,
                expected,
                actual: payload.len(),
            });
        }

        Ok(schema
            .decode_payload(payload)
            .unwrap_or_else(|| DecodedMessage::Unknown {
                message_id,
                payload: payload.to_vec(),
            }))
    }
}

impl Default for MessageDecoder {
    fn default() -> Self {
        Self::new(Arc::new(MessageTable::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat_frame(heartbeat: Heartbeat) -> Frame {
        let table = MessageTable::new();
        Frame::from_message(1, 1, 1, &heartbeat.into(), &table).unwrap()
    }

    #[test]
    fn typed_messages_follow_schema_layout() {
        let table = MessageTable::new();
        let messages = [
            DecodedMessage::from(Heartbeat::default()),
            DecodedMessage::from(CommandAck::default()),
            DecodedMessage::from(StatusText::default()),
        ];

        for message in messages {
            let schema = table.schema(message.message_id()).unwrap();
            assert!(schema.is_typed());
            assert_eq!(message.to_payload().len(), schema.payload_length());
        }
        assert_eq!(table.schemas().filter(|s| s.is_typed()).count(), 3);
    }

    #[test]
    fn heartbeat_wire_order() {
        let heartbeat = Heartbeat {
            type_: 1,
            autopilot: 3,
            base_mode: 81,
            custom_mode: 0x0102_0304,
            system_status: 4,
            mavlink_version: 3,
        };
        assert_eq!(
            DecodedMessage::from(heartbeat).to_payload(),
            vec![0x04, 0x03, 0x02, 0x01, 1, 3, 81, 4, 3]
        );
    }

    #[test]
    fn heartbeat_round_trip() {
        let heartbeat = Heartbeat {
            type_: 1,
            autopilot: 3,
            base_mode: 81,
            custom_mode: 0,
            system_status: 4,
            mavlink_version: 3,
        };
        let frame = heartbeat_frame(heartbeat.clone());
        let decoder = MessageDecoder::default();

        let decoded = decoder.decode(&frame).unwrap();
        assert_eq!(decoded, DecodedMessage::Heartbeat(heartbeat));

        let encoded = Frame::from_message(
            frame.sequence(),
            frame.system_id(),
            frame.component_id(),
            &decoded,
            decoder.table(),
        )
        .unwrap();
        assert_eq!(encoded.to_bytes(), frame.to_bytes());
    }

    #[test]
    fn armed_flag() {
        let mut heartbeat = Heartbeat {
            base_mode: 81,
            ..Default::default()
        };
        assert!(!heartbeat.is_armed());
        heartbeat.base_mode |= MAV_MODE_FLAG_SAFETY_ARMED;
        assert!(heartbeat.is_armed());
    }

    #[test]
    fn status_text_is_nul_terminated() {
        let message = DecodedMessage::from(StatusText {
            severity: 6,
            text: "PreArm: Gyros inconsistent".to_string(),
        });
        let payload = message.to_payload();
        assert_eq!(payload.len(), 51);

        let frame = Frame::new(0, 1, 1, StatusText::ID, payload, 83).unwrap();
        assert_eq!(MessageDecoder::default().decode(&frame).unwrap(), message);
    }

    #[test]
    fn command_ack_decodes() {
        let frame = Frame::new(0, 1, 1, CommandAck::ID, vec![0x90, 0x01, 0], 143).unwrap();
        assert_eq!(
            MessageDecoder::default().decode(&frame).unwrap(),
            DecodedMessage::CommandAck(CommandAck {
                command: 400,
                result: 0
            })
        );
    }

    #[test]
    fn unknown_messages_carry_payload() {
        let frame = Frame::new(0, 1, 1, 30, vec![1, 2, 3], 39).unwrap();
        let decoded = MessageDecoder::default().decode(&frame).unwrap();
        assert_eq!(
            decoded,
            DecodedMessage::Unknown {
                message_id: 30,
                payload: vec![1, 2, 3]
            }
        );
        assert_eq!(decoded.to_payload(), vec![1, 2, 3]);
    }

    #[test]
    fn short_payload_is_an_error() {
        let frame = Frame::new(0, 1, 1, Heartbeat::ID, vec![0; 5], 50).unwrap();
        assert_eq!(
            MessageDecoder::default().decode(&frame).unwrap_err(),
            DecodeError::InvalidPayloadLength {
                message_id: 0,
                expected: 9,
                actual: 5
            }
        );
    }
}
