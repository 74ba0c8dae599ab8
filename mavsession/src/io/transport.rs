use std::fmt::{Debug, Formatter};
use std::io::Write;
use std::sync::mpsc;

use crate::errors::TransportError;

/// Outgoing side of a physical or virtual link.
///
/// Implementations own any blocking: from the session's perspective [`Transport::send`] is
/// fire-and-forget, and a failure is reported to the caller without affecting link state.
pub trait Transport: Send {
    /// Sends raw bytes.
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).send(bytes)
    }
}

/// Transport that writes into anything implementing [`Write`].
///
/// ```rust
/// use mavsession::io::{Transport, WriteTransport};
///
/// let mut transport = WriteTransport::new(Vec::new());
/// transport.send(&[1, 2, 3]).unwrap();
///
/// assert_eq!(transport.into_inner(), vec![1, 2, 3]);
/// ```
pub struct WriteTransport<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> WriteTransport<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Transport for WriteTransport<W> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Debug for WriteTransport<W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteTransport").finish_non_exhaustive()
    }
}

/// In-process transport backed by an [`mpsc`] channel.
///
/// Each call to [`Transport::send`] delivers one chunk to the receiving end. Once the receiver
/// is dropped, sending fails with [`TransportError::Closed`].
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelTransport {
    /// Creates a transport and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.tx
            .send(bytes.to_vec())
            .map_err(|_| TransportError::Closed)
    }
}
