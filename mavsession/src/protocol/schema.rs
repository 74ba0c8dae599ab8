//! Message schemas and `CRC_EXTRA` table.
//!
//! MAVLink checksums are seeded with a per-message `CRC_EXTRA` byte derived from the message
//! definition. A frame can be validated only if its `CRC_EXTRA` is known, so [`MessageTable`]
//! knows `CRC_EXTRA` for a set of common-dialect messages even though only a few of them are
//! decoded into typed values.

use std::fmt::{Debug, Formatter};

use crate::protocol::message::{CommandAck, DecodedMessage, Heartbeat, StatusText};
use crate::protocol::MessageId;

/// Wire type of a message field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// `uint8_t`
    U8,
    /// `uint16_t`
    U16,
    /// `uint32_t`
    U32,
    /// `char[N]`
    Chars(usize),
}

impl FieldKind {
    /// Size of the field on the wire.
    pub const fn size(&self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::U16 => 2,
            FieldKind::U32 => 4,
            FieldKind::Chars(len) => *len,
        }
    }
}

/// Message field in wire order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// Field name as in MAVLink definitions.
    pub name: &'static str,
    /// Wire type.
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> Field {
    Field { name, kind }
}

/// Total wire size of `fields`.
pub(crate) fn fields_size(fields: &[Field]) -> usize {
    fields.iter().map(|f| f.kind.size()).sum()
}

type DecodeFn = fn(&mut PayloadReader<'_>) -> DecodedMessage;

/// Schema of a MAVLink message.
///
/// Schemas with non-empty [`MessageSchema::fields`] are decoded into typed
/// [`DecodedMessage`] variants. Other schemas only provide `CRC_EXTRA` so their frames can be
/// validated, and are surfaced as [`DecodedMessage::Unknown`].
#[derive(Clone, Copy)]
pub struct MessageSchema {
    /// Message `ID`.
    pub id: MessageId,
    /// Message name as in MAVLink definitions.
    pub name: &'static str,
    /// Checksum seed.
    pub crc_extra: u8,
    /// Fields in wire order (fields sorted by size as MAVLink requires).
    ///
    /// Describes the wire layout and defines the expected payload length. Typed messages are
    /// decoded by their own decoders which read fields in this order.
    pub fields: &'static [Field],
    decode: Option<DecodeFn>,
}

impl MessageSchema {
    const fn typed(
        id: MessageId,
        name: &'static str,
        crc_extra: u8,
        fields: &'static [Field],
        decode: DecodeFn,
    ) -> Self {
        Self {
            id,
            name,
            crc_extra,
            fields,
            decode: Some(decode),
        }
    }

    const fn raw(id: MessageId, name: &'static str, crc_extra: u8) -> Self {
        Self {
            id,
            name,
            crc_extra,
            fields: &[],
            decode: None,
        }
    }

    /// Returns `true` if messages of this schema are decoded into typed values.
    pub fn is_typed(&self) -> bool {
        self.decode.is_some()
    }

    /// Payload length declared by the fields.
    pub fn payload_length(&self) -> usize {
        fields_size(self.fields)
    }

    pub(crate) fn decode_payload(&self, payload: &[u8]) -> Option<DecodedMessage> {
        let decode = self.decode?;
        let mut reader = PayloadReader::new(payload);
        Some(decode(&mut reader))
    }
}

impl Debug for MessageSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSchema")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("crc_extra", &self.crc_extra)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

pub(crate) const HEARTBEAT_FIELDS: &[Field] = &[
    field("custom_mode", FieldKind::U32),
    field("type", FieldKind::U8),
    field("autopilot", FieldKind::U8),
    field("base_mode", FieldKind::U8),
    field("system_status", FieldKind::U8),
    field("mavlink_version", FieldKind::U8),
];

pub(crate) const COMMAND_ACK_FIELDS: &[Field] = &[
    field("command", FieldKind::U16),
    field("result", FieldKind::U8),
];

pub(crate) const STATUSTEXT_FIELDS: &[Field] = &[
    field("severity", FieldKind::U8),
    field("text", FieldKind::Chars(50)),
];

static BUILTIN_SCHEMAS: &[MessageSchema] = &[
    MessageSchema::typed(
        Heartbeat::ID,
        "HEARTBEAT",
        50,
        HEARTBEAT_FIELDS,
        Heartbeat::decode,
    ),
    MessageSchema::raw(1, "SYS_STATUS", 124),
    MessageSchema::raw(2, "SYSTEM_TIME", 137),
    MessageSchema::raw(4, "PING", 237),
    MessageSchema::raw(11, "SET_MODE", 89),
    MessageSchema::raw(20, "PARAM_REQUEST_READ", 214),
    MessageSchema::raw(21, "PARAM_REQUEST_LIST", 159),
    MessageSchema::raw(22, "PARAM_VALUE", 220),
    MessageSchema::raw(23, "PARAM_SET", 168),
    MessageSchema::raw(24, "GPS_RAW_INT", 24),
    MessageSchema::raw(25, "GPS_STATUS", 23),
    MessageSchema::raw(26, "SCALED_IMU", 170),
    MessageSchema::raw(27, "RAW_IMU", 144),
    MessageSchema::raw(29, "SCALED_PRESSURE", 115),
    MessageSchema::raw(30, "ATTITUDE", 39),
    MessageSchema::raw(31, "ATTITUDE_QUATERNION", 246),
    MessageSchema::raw(32, "LOCAL_POSITION_NED", 185),
    MessageSchema::raw(33, "GLOBAL_POSITION_INT", 104),
    MessageSchema::raw(35, "RC_CHANNELS_RAW", 244),
    MessageSchema::raw(36, "SERVO_OUTPUT_RAW", 222),
    MessageSchema::raw(39, "MISSION_ITEM", 254),
    MessageSchema::raw(40, "MISSION_REQUEST", 230),
    MessageSchema::raw(42, "MISSION_CURRENT", 28),
    MessageSchema::raw(44, "MISSION_COUNT", 221),
    MessageSchema::raw(47, "MISSION_ACK", 153),
    MessageSchema::raw(62, "NAV_CONTROLLER_OUTPUT", 183),
    MessageSchema::raw(65, "RC_CHANNELS", 118),
    MessageSchema::raw(66, "REQUEST_DATA_STREAM", 148),
    MessageSchema::raw(69, "MANUAL_CONTROL", 243),
    MessageSchema::raw(74, "VFR_HUD", 20),
    MessageSchema::raw(76, "COMMAND_LONG", 152),
    MessageSchema::typed(
        CommandAck::ID,
        "COMMAND_ACK",
        143,
        COMMAND_ACK_FIELDS,
        CommandAck::decode,
    ),
    MessageSchema::raw(109, "RADIO_STATUS", 185),
    MessageSchema::raw(111, "TIMESYNC", 34),
    MessageSchema::raw(147, "BATTERY_STATUS", 154),
    MessageSchema::raw(148, "AUTOPILOT_VERSION", 178),
    MessageSchema::raw(242, "HOME_POSITION", 104),
    MessageSchema::raw(245, "EXTENDED_SYS_STATE", 130),
    MessageSchema::typed(
        StatusText::ID,
        "STATUSTEXT",
        83,
        STATUSTEXT_FIELDS,
        StatusText::decode,
    ),
];

/// Lookup table from message `ID` to schema and `CRC_EXTRA`.
///
/// A new table contains built-in schemas. Additional `CRC_EXTRA` values for messages of custom
/// dialects can be registered by [`MessageTable::with_crc_extra`]. Such messages are validated
/// and surfaced as [`DecodedMessage::Unknown`].
///
/// ```rust
/// use mavsession::protocol::MessageTable;
///
/// let table = MessageTable::new().with_crc_extra(180, 42);
///
/// assert_eq!(table.crc_extra(0), Some(50));
/// assert_eq!(table.crc_extra(180), Some(42));
/// assert!(table.schema(180).is_none());
/// ```
#[derive(Clone)]
pub struct MessageTable {
    schemas: [Option<&'static MessageSchema>; 256],
    crc_extras: [Option<u8>; 256],
}

impl MessageTable {
    /// Creates a table populated with built-in schemas.
    pub fn new() -> Self {
        let mut schemas = [None; 256];
        let mut crc_extras = [None; 256];

        for schema in BUILTIN_SCHEMAS {
            schemas[schema.id as usize] = Some(schema);
            crc_extras[schema.id as usize] = Some(schema.crc_extra);
        }

        Self {
            schemas,
            crc_extras,
        }
    }

    /// Registers `CRC_EXTRA` for a message `ID`.
    ///
    /// Overrides built-in values: frames of a re-registered typed message will fail to validate
    /// if the peer speaks the standard definition.
    pub fn with_crc_extra(mut self, id: MessageId, crc_extra: u8) -> Self {
        self.crc_extras[id as usize] = Some(crc_extra);
        self
    }

    /// Schema of a message.
    #[inline]
    pub fn schema(&self, id: MessageId) -> Option<&'static MessageSchema> {
        self.schemas[id as usize]
    }

    /// `CRC_EXTRA` of a message.
    #[inline]
    pub fn crc_extra(&self, id: MessageId) -> Option<u8> {
        self.crc_extras[id as usize]
    }

    /// Iterator over built-in schemas.
    pub fn schemas(&self) -> impl Iterator<Item = &'static MessageSchema> + '_ {
        self.schemas.iter().filter_map(|schema| *schema)
    }
}

impl Default for MessageTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MessageTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let known = self.crc_extras.iter().filter(|e| e.is_some()).count();
        f.debug_struct("MessageTable")
            .field("known_messages", &known)
            .finish_non_exhaustive()
    }
}

/// Little-endian cursor over a payload.
///
/// Callers validate payload length against the schema beforehand.
pub(crate) struct PayloadReader<'a> {
    payload: &'a [u8],
    cursor: usize,
}

impl<'a> PayloadReader<'a> {
    pub(crate) fn new(payload: &'a [u8]) -> Self {
        Self { payload, cursor: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0u8; N];
        let end = (self.cursor + N).min(self.payload.len());
        let start = self.cursor.min(end);
        bytes[..end - start].copy_from_slice(&self.payload[start..end]);
        self.cursor += N;
        bytes
    }

    pub(crate) fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    pub(crate) fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take::<2>())
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take::<4>())
    }

    pub(crate) fn chars<const N: usize>(&mut self) -> [u8; N] {
        self.take::<N>()
    }
}

/// Little-endian payload writer.
#[derive(Default)]
pub(crate) struct PayloadWriter {
    payload: Vec<u8>,
}

impl PayloadWriter {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            payload: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn u8(mut self, value: u8) -> Self {
        self.payload.push(value);
        self
    }

    pub(crate) fn u16(mut self, value: u16) -> Self {
        self.payload.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn u32(mut self, value: u32) -> Self {
        self.payload.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn chars(mut self, value: &[u8]) -> Self {
        self.payload.extend_from_slice(value);
        self
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_unique() {
        let table = MessageTable::new();
        assert_eq!(table.schemas().count(), BUILTIN_SCHEMAS.len());
    }

    #[test]
    fn typed_schemas_declare_payload_lengths() {
        let table = MessageTable::new();
        assert_eq!(table.schema(0).unwrap().payload_length(), 9);
        assert_eq!(table.schema(77).unwrap().payload_length(), 3);
        assert_eq!(table.schema(253).unwrap().payload_length(), 51);
        assert!(!table.schema(30).unwrap().is_typed());
    }

    #[test]
    fn custom_crc_extra_is_registered() {
        let table = MessageTable::new().with_crc_extra(250, 7);
        assert_eq!(table.crc_extra(250), Some(7));
        assert_eq!(table.crc_extra(251), None);
    }

    #[test]
    fn payload_reader_is_little_endian() {
        let mut reader = PayloadReader::new(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
        assert_eq!(reader.u32(), 0x0403_0201);
        assert_eq!(reader.u16(), 0x0605);
        assert_eq!(reader.u8(), 0x07);
        // Reading past the end yields zeroes.
        assert_eq!(reader.u8(), 0);
        assert_eq!(reader.u16(), 0);
        assert_eq!(reader.u32(), 0);
    }

    #[test]
    fn payload_reader_zero_fills_partial_reads() {
        let mut reader = PayloadReader::new(&[0xAA, 0x01, 0x02]);
        assert_eq!(reader.u8(), 0xAA);
        assert_eq!(reader.u32(), 0x0000_0201);
        assert_eq!(reader.chars::<3>(), [0, 0, 0]);
    }
}
