//! CRC-16/MCRF4XX (X.25) checksum used by MAVLink.

/// Initial checksum value.
pub const CRC_INIT: u16 = 0xFFFF;

/// Incremental MAVLink checksum.
///
/// ```rust
/// use mavsession::protocol::Crc;
///
/// let mut crc = Crc::new();
/// crc.accumulate(&[9, 0, 1, 1, 0]);
/// crc.accumulate_byte(50);
///
/// assert_ne!(crc.value(), 0xFFFF);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Crc(u16);

impl Crc {
    /// Creates a checksum seeded with [`CRC_INIT`].
    pub fn new() -> Self {
        Self(CRC_INIT)
    }

    /// Accumulates a single byte.
    #[inline]
    pub fn accumulate_byte(&mut self, byte: u8) {
        let tmp = byte ^ (self.0 as u8);
        let tmp = (tmp ^ (tmp << 4)) as u16;
        self.0 = (self.0 >> 8) ^ (tmp << 8) ^ (tmp << 3) ^ (tmp >> 4);
    }

    /// Accumulates a slice of bytes.
    pub fn accumulate(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.accumulate_byte(byte);
        }
    }

    /// Current checksum value.
    #[inline(always)]
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl Default for Crc {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculates MAVLink checksum over `data` followed by `crc_extra`.
pub fn checksum(data: &[u8], crc_extra: u8) -> u16 {
    let mut crc = Crc::new();
    crc.accumulate(data);
    crc.accumulate_byte(crc_extra);
    crc.value()
}
