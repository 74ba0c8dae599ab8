//! # Asynchronous runner
//!
//! [`LinkDriver`] drives a [`LinkSession`](crate::session::LinkSession) from a Tokio task which
//! selects between an [`AsyncRead`](tokio::io::AsyncRead) source and a liveness
//! [`interval`](tokio::time::interval). Events are re-broadcast to async consumers through
//! [`LinkDriver::events`].
//!
//! Outgoing bytes are forwarded to an [`AsyncWrite`](tokio::io::AsyncWrite) by
//! [`WriterTransport`]. [`TokioClock`] follows Tokio time, so paused-time tests advance heartbeat
//! timeouts deterministically.

mod clock;
mod driver;
mod transport;

pub use clock::TokioClock;
pub use driver::LinkDriver;
pub use transport::{open_serial, WriterTransport};
