//! Reassembly of frames from a raw byte stream.

use std::mem;
use std::sync::Arc;

use crate::consts::{CHECKSUM_SIZE, DEFAULT_MAX_STALLED_CHUNKS, HEADER_SIZE, STX_V1};
use crate::protocol::{Frame, MessageId, MessageTable, Sequence};

/// Counters collected by [`FrameReassembler`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReassemblerStats {
    /// Frames that passed checksum validation.
    pub frames: u64,
    /// Complete frames with a checksum mismatch.
    pub checksum_errors: u64,
    /// Complete frames with a message `ID` that has no known `CRC_EXTRA`.
    pub unknown_crc_extra: u64,
    /// Bytes skipped while searching for a start-of-frame marker.
    pub bytes_skipped: u64,
    /// Incomplete frames dropped after stalling for too many chunks.
    pub stalled_resets: u64,
}

/// Notable events that happened during reassembly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReassemblerNotice {
    /// A complete frame failed checksum validation.
    ChecksumMismatch {
        /// Message `ID` from the rejected header.
        message_id: MessageId,
        /// Sequence from the rejected header.
        sequence: Sequence,
    },
    /// A complete frame has a message `ID` with no known `CRC_EXTRA`.
    UnknownCrcExtra {
        /// Message `ID` from the rejected header.
        message_id: MessageId,
    },
    /// An incomplete frame was dropped since it did not complete in time.
    StalledFrame {
        /// Number of bytes buffered when the frame was dropped.
        buffered: usize,
    },
}

/// Extracts checksum-validated frames from a byte stream split at arbitrary boundaries.
///
/// Bytes are appended by [`FrameReassembler::feed`] which returns a lazy iterator over
/// [`Frame`]s. Incomplete frames stay buffered between calls. If the iterator is dropped early,
/// remaining frames are produced by the next call.
///
/// Invalid frames are skipped by advancing one byte past their start-of-frame marker, so a
/// corrupted frame never swallows valid frames that follow it. An incomplete frame that does
/// not complete within `max_stalled_chunks` consecutive calls to [`FrameReassembler::feed`] is
/// dropped the same way.
///
/// ```rust
/// use mavsession::protocol::{DecodedMessage, Frame, FrameReassembler, Heartbeat, MessageTable};
///
/// let table = MessageTable::new();
/// let message = DecodedMessage::from(Heartbeat::default());
/// let bytes = Frame::from_message(0, 1, 1, &message, &table).unwrap().to_bytes();
///
/// let mut reassembler = FrameReassembler::default();
/// assert_eq!(reassembler.feed(&bytes[..5]).count(), 0);
///
/// let frames: Vec<Frame> = reassembler.feed(&bytes[5..]).collect();
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0].to_bytes(), bytes);
/// ```
#[derive(Debug)]
pub struct FrameReassembler {
    table: Arc<MessageTable>,
    buffer: Vec<u8>,
    cursor: usize,
    max_stalled_chunks: usize,
    stalled_chunks: usize,
    stats: ReassemblerStats,
    notices: Vec<ReassemblerNotice>,
}

impl FrameReassembler {
    /// Creates a reassembler which validates frames using `CRC_EXTRA` from `table`.
    pub fn new(table: Arc<MessageTable>, max_stalled_chunks: usize) -> Self {
        Self {
            table,
            buffer: Vec::new(),
            cursor: 0,
            max_stalled_chunks,
            stalled_chunks: 0,
            stats: ReassemblerStats::default(),
            notices: Vec::new(),
        }
    }

    /// Appends `bytes` to the internal buffer and returns an iterator over complete frames.
    pub fn feed(&mut self, bytes: &[u8]) -> Frames<'_> {
        if self.has_pending_bytes() {
            self.stalled_chunks += 1;
        }

        self.buffer.drain(..self.cursor);
        self.cursor = 0;
        self.buffer.extend_from_slice(bytes);

        Frames { reassembler: self }
    }

    /// Number of buffered bytes not yet consumed.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    /// Collected counters.
    #[inline]
    pub fn stats(&self) -> ReassemblerStats {
        self.stats
    }

    /// Takes notices accumulated since the last call.
    pub fn take_notices(&mut self) -> Vec<ReassemblerNotice> {
        mem::take(&mut self.notices)
    }

    /// Drops all buffered bytes.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.stalled_chunks = 0;
    }

    fn has_pending_bytes(&self) -> bool {
        self.buffered() > 0
    }

    fn pending(&self) -> &[u8] {
        &self.buffer[self.cursor..]
    }

    /// Advances past `count` bytes. The stall count belongs to the frame start at the cursor.
    fn skip(&mut self, count: usize) {
        self.cursor += count;
        self.stalled_chunks = 0;
    }

    fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match self.pending().iter().position(|&b| b == STX_V1) {
                Some(0) => {}
                Some(offset) => {
                    self.stats.bytes_skipped += offset as u64;
                    self.skip(offset);
                }
                None => {
                    self.stats.bytes_skipped += self.buffered() as u64;
                    self.skip(self.buffered());
                    return None;
                }
            }

            let frame_size = match self.pending().get(1) {
                Some(&len) => HEADER_SIZE + len as usize + CHECKSUM_SIZE,
                None => usize::MAX,
            };
            if frame_size > self.buffered() {
                if self.drop_stalled() {
                    continue;
                }
                return None;
            }

            let frame = match Frame::parse_unchecked(&self.pending()[..frame_size]) {
                Some(frame) => frame,
                None => {
                    self.skip(1);
                    continue;
                }
            };

            match self.table.crc_extra(frame.message_id()) {
                Some(crc_extra) if frame.validate_checksum(crc_extra) => {
                    self.skip(frame_size);
                    self.stats.frames += 1;
                    return Some(frame);
                }
                Some(_) => {
                    log::trace!(
                        "checksum mismatch for message #{} seq {}, resynchronising",
                        frame.message_id(),
                        frame.sequence()
                    );
                    self.stats.checksum_errors += 1;
                    self.notices.push(ReassemblerNotice::ChecksumMismatch {
                        message_id: frame.message_id(),
                        sequence: frame.sequence(),
                    });
                }
                None => {
                    log::trace!(
                        "no CRC_EXTRA for message #{}, resynchronising",
                        frame.message_id()
                    );
                    self.stats.unknown_crc_extra += 1;
                    self.notices.push(ReassemblerNotice::UnknownCrcExtra {
                        message_id: frame.message_id(),
                    });
                }
            }

            self.stats.bytes_skipped += 1;
            self.skip(1);
        }
    }

    fn drop_stalled(&mut self) -> bool {
        if self.stalled_chunks <= self.max_stalled_chunks {
            return false;
        }

        let buffered = self.buffered();
        log::trace!("dropping incomplete frame stalled for {} chunks", self.stalled_chunks);

        self.stats.stalled_resets += 1;
        self.stats.bytes_skipped += 1;
        self.notices.push(ReassemblerNotice::StalledFrame { buffered });
        self.skip(1);

        true
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new(Arc::new(MessageTable::new()), DEFAULT_MAX_STALLED_CHUNKS)
    }
}

/// Lazy iterator over frames extracted by [`FrameReassembler::feed`].
pub struct Frames<'a> {
    reassembler: &'a mut FrameReassembler,
}

impl Frames<'_> {
    /// Takes notices raised so far, including those raised while producing the last frame.
    ///
    /// Allows a consumer to interleave notices with frames in stream order.
    pub fn take_notices(&mut self) -> Vec<ReassemblerNotice> {
        self.reassembler.take_notices()
    }
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        self.reassembler.next_frame()
    }
}
