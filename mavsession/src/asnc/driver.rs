use std::io::ErrorKind;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::consts::{EVENTS_CHANNEL_CAPACITY, READ_BUFFER_SIZE};
use crate::session::{Event, LinkSession, TransportId};
use crate::utils::{Closable, Closer};

use crate::prelude::*;

/// <sup>`async`</sup>
/// Runs a [`LinkSession`] on a Tokio task.
///
/// The task reads from an [`AsyncRead`] source and ticks liveness checks every
/// [`LinkConf::liveness_check_interval`](crate::session::LinkConf::liveness_check_interval). After
/// the source reaches end of stream or fails, liveness checks continue until the driver is
/// closed, so the link will eventually be reported as lost.
///
/// # Usage
///
/// ```rust,no_run
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> mavsession::errors::Result<()> {
/// use std::sync::Arc;
/// use tokio_stream::StreamExt;
/// use mavsession::prelude::*;
/// use mavsession::asnc::{open_serial, LinkDriver, TokioClock};
///
/// let (transport, reader) = open_serial("/dev/ttyUSB0", 57_600)?;
/// let session = LinkSession::new("/dev/ttyUSB0", &LinkConf::default(), transport, Arc::new(TokioClock));
///
/// let driver = LinkDriver::spawn(session, reader);
/// let mut events = driver.events();
///
/// while let Some(event) = events.next().await {
///     if let Event::LinkLost { .. } = event {
///         break;
///     }
/// }
///
/// driver.close().await
/// # }
/// ```
#[derive(Debug)]
pub struct LinkDriver {
    id: TransportId,
    session: Arc<Mutex<LinkSession>>,
    events_tx: broadcast::Sender<Event>,
    closer: Closer,
    stop: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl LinkDriver {
    /// Spawns a driver task for `session`.
    ///
    /// Must be called within a Tokio runtime.
    pub fn spawn<R: AsyncRead + Unpin + Send + 'static>(mut session: LinkSession, reader: R) -> Self {
        let id = session.id().clone();
        let interval = session.conf().liveness_check_interval();

        let (events_tx, _) = broadcast::channel(EVENTS_CHANNEL_CAPACITY);
        let forward_tx = events_tx.clone();
        session.subscribe(move |event, _| {
            // No receivers is not an error
            let _ = forward_tx.send(event.clone());
        });

        let session = Arc::new(Mutex::new(session));
        let closer = Closer::new();
        let stop = Arc::new(Notify::new());

        let handle = tokio::spawn(run(
            id.clone(),
            session.clone(),
            reader,
            interval,
            closer.to_closable(),
            stop.clone(),
        ));

        log::debug!("[{id}] link driver started");

        Self {
            id,
            session,
            events_tx,
            closer,
            stop,
            handle,
        }
    }

    /// Transport identity of the driven session.
    pub fn id(&self) -> &TransportId {
        &self.id
    }

    /// Stream of session events.
    ///
    /// Only events dispatched after this call are delivered. A consumer that falls behind by
    /// more than the channel capacity silently skips the oldest events.
    pub fn events(&self) -> impl Stream<Item = Event> + Unpin {
        BroadcastStream::new(self.events_tx.subscribe()).filter_map(|event| event.ok())
    }

    /// Runs `f` with exclusive access to the session.
    ///
    /// The lock is held only for the duration of `f` which must not block.
    pub fn with_session<T>(&self, f: impl FnOnce(&mut LinkSession) -> T) -> Result<T> {
        let mut session = self.session.lock()?;
        Ok(f(&mut session))
    }

    /// Returns `true` if the driver task has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the driver task and waits for it to finish.
    pub async fn close(mut self) -> Result<()> {
        self.closer.close();
        self.stop.notify_one();

        if self.handle.await.is_err() {
            return Err(Error::Poisoned);
        }
        log::debug!("[{}] link driver stopped", self.id);

        Ok(())
    }
}

async fn run<R: AsyncRead + Unpin + Send + 'static>(
    id: TransportId,
    session: Arc<Mutex<LinkSession>>,
    mut reader: R,
    interval: Duration,
    state: Closable,
    stop: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut reading = true;

    while !state.is_closed() {
        tokio::select! {
            result = reader.read(&mut buf), if reading => {
                let bytes_read = match result {
                    Ok(0) => {
                        log::debug!("[{id}] end of stream");
                        reading = false;
                        continue;
                    }
                    Ok(bytes_read) => bytes_read,
                    Err(err) => match err.kind() {
                        ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock => continue,
                        _ => {
                            log::warn!("[{id}] read failed: {err}");
                            reading = false;
                            continue;
                        }
                    },
                };

                match session.lock() {
                    Ok(mut session) => session.receive_bytes(&buf[..bytes_read]),
                    Err(_) => {
                        log::error!("[{id}] session lock is poisoned, stopping driver");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                match session.lock() {
                    Ok(mut session) => session.check_liveness(),
                    Err(_) => {
                        log::error!("[{id}] session lock is poisoned, stopping driver");
                        break;
                    }
                }
            }
            _ = stop.notified() => break,
        }
    }

    log::trace!("[{id}] driver task stopped");
}
