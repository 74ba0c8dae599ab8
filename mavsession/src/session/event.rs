use std::time::Duration;

use crate::protocol::{ComponentId, DecodedMessage, Frame, Sequence, SystemId};

/// Events dispatched by a [`LinkSession`](crate::session::LinkSession) to its subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A message was received and decoded.
    Message(IncomingMessage),
    /// Frame sequence is not the successor of the previous one.
    ///
    /// Dispatched right before the message of the frame that revealed the gap.
    SequenceGap {
        /// Sequence that was expected.
        expected: Sequence,
        /// Sequence that was received.
        received: Sequence,
    },
    /// The first heartbeat was received.
    LinkEstablished,
    /// No heartbeats were received within heartbeat timeout.
    LinkLost {
        /// Time since the last heartbeat.
        silent_for: Duration,
    },
    /// A heartbeat was received after the link had been lost.
    LinkRecovered,
    /// An incomplete frame was discarded after stalling.
    BufferReset {
        /// Bytes buffered at the moment of reset.
        buffered: usize,
    },
}

/// Decoded message together with the header of the frame that carried it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    /// System `ID` of the sender.
    pub system_id: SystemId,
    /// Component `ID` of the sender.
    pub component_id: ComponentId,
    /// Frame sequence.
    pub sequence: Sequence,
    /// Decoded message.
    pub message: DecodedMessage,
}

impl IncomingMessage {
    pub(crate) fn new(frame: &Frame, message: DecodedMessage) -> Self {
        Self {
            system_id: frame.system_id(),
            component_id: frame.component_id(),
            sequence: frame.sequence(),
            message,
        }
    }
}
