//! Link state: sequence tracking and heartbeat liveness.

use std::time::{Duration, Instant};

use crate::protocol::Sequence;
use crate::session::Event;

/// Heartbeat liveness of a link.
///
/// ```text
/// Unknown --heartbeat--> Alive --timeout--> Dead --heartbeat--> Alive
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Liveness {
    /// No heartbeat received yet.
    #[default]
    Unknown,
    /// Heartbeats arrive within timeout.
    Alive,
    /// Heartbeat timeout elapsed.
    Dead,
}

/// Per-link state mutated only by the owning [`LinkSession`](crate::session::LinkSession).
///
/// Serialized snapshots omit the instant of the last heartbeat since it is only meaningful
/// within the running process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkState {
    last_sequence: Option<Sequence>,
    #[cfg_attr(feature = "serde", serde(skip))]
    last_heartbeat: Option<Instant>,
    liveness: Liveness,
}

impl LinkState {
    /// Sequence of the last accepted frame.
    #[inline]
    pub fn last_sequence(&self) -> Option<Sequence> {
        self.last_sequence
    }

    /// Instant of the last heartbeat.
    #[inline]
    pub fn last_heartbeat(&self) -> Option<Instant> {
        self.last_heartbeat
    }

    /// Current liveness.
    #[inline]
    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    /// Returns `true` if the link is [`Liveness::Alive`].
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.liveness == Liveness::Alive
    }

    /// Records frame sequence and returns a gap event if it is not the expected successor.
    pub(crate) fn observe_sequence(&mut self, sequence: Sequence) -> Option<Event> {
        let gap = match self.last_sequence {
            Some(last) if last.wrapping_add(1) != sequence => Some(Event::SequenceGap {
                expected: last.wrapping_add(1),
                received: sequence,
            }),
            _ => None,
        };
        self.last_sequence = Some(sequence);
        gap
    }

    /// Records heartbeat and returns a transition event if liveness has changed.
    pub(crate) fn record_heartbeat(&mut self, now: Instant) -> Option<Event> {
        self.last_heartbeat = Some(now);

        let previous = self.liveness;
        self.liveness = Liveness::Alive;

        match previous {
            Liveness::Unknown => Some(Event::LinkEstablished),
            Liveness::Dead => Some(Event::LinkRecovered),
            Liveness::Alive => None,
        }
    }

    /// Marks a live link as dead once `timeout` has elapsed since the last heartbeat.
    ///
    /// Returns [`Event::LinkLost`] only on transition, so each loss is reported once.
    pub(crate) fn check_timeout(&mut self, now: Instant, timeout: Duration) -> Option<Event> {
        if self.liveness != Liveness::Alive {
            return None;
        }

        let silent_for = now.saturating_duration_since(self.last_heartbeat?);
        if silent_for < timeout {
            return None;
        }

        self.liveness = Liveness::Dead;
        Some(Event::LinkLost { silent_for })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(3);

    #[test]
    fn sequence_gaps_wrap_around() {
        let mut state = LinkState::default();

        assert_eq!(state.observe_sequence(254), None);
        assert_eq!(state.observe_sequence(255), None);
        assert_eq!(state.observe_sequence(0), None);
        assert_eq!(
            state.observe_sequence(2),
            Some(Event::SequenceGap {
                expected: 1,
                received: 2
            })
        );
        assert_eq!(state.last_sequence(), Some(2));
    }

    #[test]
    fn repeated_sequence_is_a_gap() {
        let mut state = LinkState::default();
        state.observe_sequence(10);

        assert_eq!(
            state.observe_sequence(10),
            Some(Event::SequenceGap {
                expected: 11,
                received: 10
            })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn link_state_snapshots_are_serializable() {
        fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}

        assert_serde::<LinkState>();
        assert_serde::<Liveness>();
        assert_serde::<crate::session::LinkDiagnostics>();
    }

    #[test]
    fn liveness_transitions() {
        let start = Instant::now();
        let mut state = LinkState::default();

        assert_eq!(state.check_timeout(start + TIMEOUT * 2, TIMEOUT), None);
        assert_eq!(state.liveness(), Liveness::Unknown);

        assert_eq!(state.record_heartbeat(start), Some(Event::LinkEstablished));
        assert!(state.is_alive());
        assert_eq!(state.record_heartbeat(start), None);

        assert_eq!(
            state.check_timeout(start + Duration::from_millis(2999), TIMEOUT),
            None
        );
        assert_eq!(
            state.check_timeout(start + TIMEOUT, TIMEOUT),
            Some(Event::LinkLost {
                silent_for: TIMEOUT
            })
        );
        assert_eq!(state.liveness(), Liveness::Dead);
        assert_eq!(state.check_timeout(start + TIMEOUT * 5, TIMEOUT), None);

        assert_eq!(
            state.record_heartbeat(start + TIMEOUT * 6),
            Some(Event::LinkRecovered)
        );
        assert!(state.is_alive());
    }
}
