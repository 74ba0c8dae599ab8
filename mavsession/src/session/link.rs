//! Link session.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::errors::TransportError;
use crate::io::{Clock, Transport};
use crate::protocol::{
    DecodedMessage, Frame, FrameReassembler, MessageDecoder, ReassemblerNotice, ReassemblerStats,
    Sequence,
};
use crate::session::subscribers::Subscribers;
use crate::session::{
    Event, IncomingMessage, LinkConf, LinkState, Liveness, Subscription, SubscriptionId,
    TransportId,
};

use crate::prelude::*;

/// Snapshot of link counters returned by [`LinkSession::diagnostics`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkDiagnostics {
    /// Frame reassembly counters.
    pub reassembler: ReassemblerStats,
    /// Bytes passed to [`LinkSession::receive_bytes`].
    pub bytes_received: u64,
    /// Bytes successfully handed to the transport.
    pub bytes_sent: u64,
    /// Decoded messages dispatched to subscribers.
    pub messages: u64,
    /// Validated frames which payload didn't match the message schema.
    pub decode_errors: u64,
    /// Detected sequence gaps.
    pub sequence_gaps: u64,
    /// Number of times the link was lost.
    pub links_lost: u64,
    /// Current liveness.
    pub liveness: Liveness,
}

/// One logical MAVLink connection.
///
/// A session is driven by its owner: incoming bytes are pushed by [`LinkSession::receive_bytes`]
/// and liveness is checked by periodic calls to [`LinkSession::check_liveness`]. Events are
/// dispatched synchronously to subscribers from within these calls.
///
/// # Usage
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use mavsession::prelude::*;
/// use mavsession::io::{ChannelTransport, ManualClock};
/// use mavsession::protocol::{Frame, Heartbeat, MessageTable};
///
/// let (transport, _outgoing) = ChannelTransport::new();
/// let mut session = LinkSession::new(
///     "/dev/ttyUSB0",
///     &LinkConf::default(),
///     transport,
///     Arc::new(ManualClock::new()),
/// );
///
/// let received = Arc::new(Mutex::new(Vec::new()));
/// let sink = received.clone();
/// session.subscribe(move |event, _| sink.lock().unwrap().push(event.clone()));
///
/// let heartbeat = DecodedMessage::from(Heartbeat::default());
/// let frame = Frame::from_message(0, 1, 1, &heartbeat, &MessageTable::new()).unwrap();
/// session.receive_bytes(&frame.to_bytes());
///
/// assert!(session.state().is_alive());
/// assert_eq!(received.lock().unwrap()[0], Event::LinkEstablished);
/// ```
pub struct LinkSession {
    id: TransportId,
    conf: LinkConf,
    reassembler: FrameReassembler,
    decoder: MessageDecoder,
    transport: Box<dyn Transport>,
    clock: Arc<dyn Clock>,
    state: LinkState,
    subscribers: Subscribers,
    outgoing_sequence: Sequence,
    diagnostics: LinkDiagnostics,
}

impl LinkSession {
    /// Creates a session bound to `transport`.
    pub fn new(
        id: impl Into<TransportId>,
        conf: &LinkConf,
        transport: impl Transport + 'static,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let id = id.into();
        log::debug!("[{id}] opening link session");

        Self {
            id,
            conf: conf.clone(),
            reassembler: FrameReassembler::new(
                conf.message_table.clone(),
                conf.max_stalled_chunks,
            ),
            decoder: MessageDecoder::new(conf.message_table.clone()),
            transport: Box::new(transport),
            clock,
            state: LinkState::default(),
            subscribers: Subscribers::default(),
            outgoing_sequence: 0,
            diagnostics: LinkDiagnostics::default(),
        }
    }

    /// Transport identity.
    #[inline]
    pub fn id(&self) -> &TransportId {
        &self.id
    }

    /// Session configuration.
    #[inline]
    pub fn conf(&self) -> &LinkConf {
        &self.conf
    }

    /// Current link state.
    #[inline]
    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Number of active subscribers.
    pub fn subscribers(&self) -> usize {
        self.subscribers.len()
    }

    /// Snapshot of link counters.
    pub fn diagnostics(&self) -> LinkDiagnostics {
        LinkDiagnostics {
            reassembler: self.reassembler.stats(),
            liveness: self.state.liveness(),
            ..self.diagnostics
        }
    }

    /// Registers a callback invoked for each [`Event`] in arrival order.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&Event, &Subscription) + Send + 'static,
    {
        let id = self.subscribers.subscribe(Box::new(callback));
        log::trace!("[{}] subscriber {id} added", self.id);
        id
    }

    /// Removes a subscriber.
    ///
    /// Returns `false` if there is no active subscriber with such `id`.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.unsubscribe(id);
        if removed {
            log::trace!("[{}] subscriber {id} removed", self.id);
        }
        removed
    }

    /// Processes incoming bytes.
    ///
    /// Extracts all complete frames, decodes them, updates [`LinkState`] and dispatches the
    /// resulting events. A [`Event::SequenceGap`] precedes the message that revealed it.
    /// Frames which fail to decode are logged and skipped, their sequence is still tracked.
    pub fn receive_bytes(&mut self, bytes: &[u8]) {
        self.diagnostics.bytes_received += bytes.len() as u64;
        let now = self.clock.now();
        let mut events = Vec::new();

        let mut frames = self.reassembler.feed(bytes);
        loop {
            let next = frames.next();
            for notice in frames.take_notices() {
                if let Some(event) = notice_event(&self.id, notice) {
                    events.push(event);
                }
            }
            let Some(frame) = next else {
                break;
            };

            log::trace!("[{}] received {frame:?}", self.id);

            if let Some(gap) = self.state.observe_sequence(frame.sequence()) {
                log::trace!("[{}] {gap:?}", self.id);
                self.diagnostics.sequence_gaps += 1;
                events.push(gap);
            }

            let message = match self.decoder.decode(&frame) {
                Ok(message) => message,
                Err(err) => {
                    log::warn!("[{}] skipping frame #{}: {err}", self.id, frame.sequence());
                    self.diagnostics.decode_errors += 1;
                    continue;
                }
            };

            if message.is_heartbeat() {
                if let Some(transition) = self.state.record_heartbeat(now) {
                    log::debug!("[{}] {transition:?}", self.id);
                    events.push(transition);
                }
            }

            self.diagnostics.messages += 1;
            events.push(Event::Message(IncomingMessage::new(&frame, message)));
        }

        self.subscribers.dispatch(&events);
    }

    /// Marks the link as lost if no heartbeat arrived within heartbeat timeout.
    ///
    /// Meant to be called periodically, see [`LinkConf::liveness_check_interval`].
    /// [`Event::LinkLost`] is dispatched once per loss.
    pub fn check_liveness(&mut self) {
        let now = self.clock.now();
        if let Some(event) = self.state.check_timeout(now, self.conf.heartbeat_timeout) {
            log::debug!("[{}] {event:?}", self.id);
            self.diagnostics.links_lost += 1;
            self.subscribers.dispatch(&[event]);
        }
    }

    /// Hands raw bytes to the transport.
    ///
    /// Failures are returned to the caller and never affect [`LinkState`].
    pub fn send_command(&mut self, bytes: &[u8]) -> core::result::Result<(), TransportError> {
        match self.transport.send(bytes) {
            Ok(()) => {
                self.diagnostics.bytes_sent += bytes.len() as u64;
                Ok(())
            }
            Err(err) => {
                log::debug!("[{}] failed to send {} bytes: {err}", self.id, bytes.len());
                Err(err)
            }
        }
    }

    /// Encodes a message into a frame from this session and sends it.
    ///
    /// Frames carry system and component `ID`s from [`LinkConf`] and an outgoing sequence which
    /// wraps at 256. Returns the sequence of the sent frame.
    pub fn send_message(&mut self, message: &DecodedMessage) -> Result<Sequence> {
        let sequence = self.outgoing_sequence;
        let frame = Frame::from_message(
            sequence,
            self.conf.system_id,
            self.conf.component_id,
            message,
            self.decoder.table(),
        )?;
        self.outgoing_sequence = sequence.wrapping_add(1);

        log::trace!("[{}] sending {frame:?}", self.id);
        self.send_command(&frame.to_bytes())?;

        Ok(sequence)
    }

    /// Tears the session down, releasing its transport and subscribers.
    pub fn close(self) {
        log::debug!("[{}] closing link session", self.id);
    }
}

impl Debug for LinkSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("subscribers", &self.subscribers)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

fn notice_event(id: &TransportId, notice: ReassemblerNotice) -> Option<Event> {
    match notice {
        ReassemblerNotice::StalledFrame { buffered } => {
            log::warn!("[{id}] dropping incomplete frame, {buffered} bytes buffered");
            Some(Event::BufferReset { buffered })
        }
        ReassemblerNotice::ChecksumMismatch {
            message_id,
            sequence,
        } => {
            log::debug!("[{id}] checksum mismatch for message #{message_id} seq {sequence}");
            None
        }
        ReassemblerNotice::UnknownCrcExtra { message_id } => {
            log::debug!("[{id}] no CRC_EXTRA for message #{message_id}");
            None
        }
    }
}
