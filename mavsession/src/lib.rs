//! # Mavsession
//!
//! A transport-independent [MAVLink](https://mavlink.io/en/) session layer. Mavsession turns a raw
//! byte stream into validated `MAVLink 1` frames, decodes them into typed messages, tracks
//! per-link packet sequence and [heartbeat](https://mavlink.io/en/services/heartbeat.html)
//! liveness, and dispatches decoded messages and link-health events to subscribers.
//!
//! Mavsession does not own any device. Incoming bytes are pushed into a
//! [`LinkSession`](session::LinkSession) by its owner and outgoing bytes are handed to an injected
//! [`Transport`](io::Transport). Time is read from an injected [`Clock`](io::Clock). This makes
//! the core deterministic and easy to drive from any event loop.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//!
//! use mavsession::prelude::*;
//! use mavsession::io::{ChannelTransport, ManualClock};
//! use mavsession::protocol::{Frame, Heartbeat, MessageTable};
//!
//! let clock = ManualClock::new();
//! let (transport, _outgoing) = ChannelTransport::new();
//! let conf = LinkConf::builder()
//!     .heartbeat_timeout(Duration::from_secs(3))
//!     .build();
//!
//! let mut session = LinkSession::new("/dev/ttyUSB0", &conf, transport, Arc::new(clock.clone()));
//!
//! let lost = Arc::new(Mutex::new(0));
//! let counter = lost.clone();
//! session.subscribe(move |event, _| {
//!     if let Event::LinkLost { .. } = event {
//!         *counter.lock().unwrap() += 1;
//!     }
//! });
//!
//! let heartbeat = DecodedMessage::from(Heartbeat::default());
//! let bytes = Frame::from_message(0, 1, 1, &heartbeat, &MessageTable::new())
//!     .unwrap()
//!     .to_bytes();
//!
//! // Bytes may arrive split at arbitrary boundaries
//! session.receive_bytes(&bytes[..4]);
//! session.receive_bytes(&bytes[4..]);
//! assert!(session.state().is_alive());
//!
//! clock.advance(Duration::from_secs(3));
//! session.check_liveness();
//! session.check_liveness();
//! assert_eq!(*lost.lock().unwrap(), 1);
//! ```
//!
//! # Runners
//!
//! Sessions can be driven by a background runner which reads a byte source and ticks liveness
//! checks:
//!
//! * `sync::LinkRunner` runs on threads over any [`Read`](std::io::Read) (`sync` feature).
//! * `asnc::LinkDriver` runs on a Tokio task over any `AsyncRead` (`async` feature).
//!
//! # Feature flags
//!
#![doc = document_features::document_features!()]
//
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod consts;
pub mod errors;
pub mod io;
pub mod prelude;
pub mod protocol;
pub mod session;
pub mod utils;

#[cfg(feature = "async")]
pub mod asnc;
#[cfg(feature = "sync")]
pub mod sync;

#[cfg(test)]
pub(crate) mod test_utils;
