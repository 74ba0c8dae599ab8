//! # Boundary collaborators
//!
//! A [`LinkSession`](crate::session::LinkSession) never talks to devices directly. It hands
//! outgoing bytes to a [`Transport`] and reads the current time from a [`Clock`]. Both are
//! injected at construction.
//!
//! Incoming bytes are pushed into a session by its owner, either directly through
//! [`LinkSession::receive_bytes`](crate::session::LinkSession::receive_bytes) or by one of the
//! runners: `sync::LinkRunner` and `asnc::LinkDriver`.

mod clock;
#[cfg(feature = "sync")]
mod serial;
mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
#[cfg(feature = "sync")]
/// <sup>`sync`</sup>
pub use serial::SerialPortConf;
pub use transport::{ChannelTransport, Transport, WriteTransport};
