//! # Link sessions
//!
//! A [`LinkSession`] owns one logical MAVLink connection. It feeds incoming bytes through a
//! [`FrameReassembler`](crate::protocol::FrameReassembler) and a
//! [`MessageDecoder`](crate::protocol::MessageDecoder), tracks sequence numbers and heartbeat
//! liveness in [`LinkState`], and dispatches [`Event`]s to subscribers.
//!
//! [`SessionRegistry`] keeps several sessions keyed by [`TransportId`].

mod conf;
mod event;
mod link;
mod registry;
mod state;
mod subscribers;

use std::fmt::{Display, Formatter};

pub use conf::{LinkConf, LinkConfBuilder};
pub use event::{Event, IncomingMessage};
pub use link::{LinkDiagnostics, LinkSession};
pub use registry::SessionRegistry;
pub use state::{LinkState, Liveness};
pub use subscribers::{Subscription, SubscriptionId};

/// Identity of the transport a session is bound to.
///
/// Usually a device path or a network address.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransportId(String);

impl TransportId {
    /// Creates transport identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// String representation.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransportId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransportId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TransportId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&TransportId> for TransportId {
    fn from(value: &TransportId) -> Self {
        value.clone()
    }
}
