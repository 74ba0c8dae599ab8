use tokio::io::{AsyncWrite, AsyncWriteExt, ReadHalf};
use tokio::sync::mpsc;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::errors::TransportError;
use crate::io::Transport;

use crate::prelude::*;

/// <sup>`async`</sup>
/// Transport that forwards outgoing bytes to an [`AsyncWrite`].
///
/// Bytes are queued into an unbounded channel and written by a background task, so
/// [`Transport::send`] never blocks. Once the writer fails, the task stops and further sends
/// return [`TransportError::Closed`].
#[derive(Clone, Debug)]
pub struct WriterTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl WriterTransport {
    /// Spawns a writer task.
    ///
    /// Must be called within a Tokio runtime.
    pub fn spawn<W: AsyncWrite + Unpin + Send + 'static>(mut writer: W) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                if let Err(err) = writer.write_all(&bytes).await {
                    log::warn!("writer failed: {err}");
                    break;
                }
                if let Err(err) = writer.flush().await {
                    log::warn!("writer failed to flush: {err}");
                    break;
                }
            }
            log::trace!("writer stopped");
        });

        Self { tx }
    }
}

impl Transport for WriterTransport {
    fn send(&mut self, bytes: &[u8]) -> core::result::Result<(), TransportError> {
        self.tx
            .send(bytes.to_vec())
            .map_err(|_| TransportError::Closed)
    }
}

/// <sup>`async`</sup>
/// Opens a serial port for asynchronous use.
///
/// Returns a transport for outgoing bytes and a reader for [`LinkDriver`](super::LinkDriver).
/// Must be called within a Tokio runtime.
pub fn open_serial(
    path: &str,
    baud_rate: u32,
) -> Result<(WriterTransport, ReadHalf<SerialStream>)> {
    let port = tokio_serial::new(path, baud_rate)
        .open_native_async()
        .map_err(std::io::Error::from)?;
    let (reader, writer) = tokio::io::split(port);

    log::debug!("[{path}] serial port opened at {baud_rate} baud");

    Ok((WriterTransport::spawn(writer), reader))
}
