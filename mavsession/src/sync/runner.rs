use std::io::{ErrorKind, Read};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::consts::READ_BUFFER_SIZE;
use crate::session::{LinkSession, TransportId};
use crate::utils::{Closable, Closer};

use crate::prelude::*;

const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(1);

/// <sup>`sync`</sup>
/// Runs a [`LinkSession`] on background threads.
///
/// Threads are stopped when runner is closed by [`LinkRunner::close`] or dropped. The reader
/// thread notices that only after its pending read returns, so readers should have a read
/// timeout.
///
/// # Usage
///
/// ```rust
/// use std::io::Cursor;
/// use std::sync::Arc;
/// use mavsession::prelude::*;
/// use mavsession::io::{ChannelTransport, SystemClock};
/// use mavsession::sync::LinkRunner;
///
/// let (transport, _) = ChannelTransport::new();
/// let session = LinkSession::new("replay", &LinkConf::default(), transport, Arc::new(SystemClock));
///
/// let runner = LinkRunner::spawn(session, Cursor::new(Vec::<u8>::new()));
/// let session = runner.close().unwrap();
/// assert!(!session.state().is_alive());
/// ```
#[derive(Debug)]
pub struct LinkRunner {
    id: TransportId,
    session: Arc<Mutex<LinkSession>>,
    closer: Closer,
    reader: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

impl LinkRunner {
    /// Spawns reader and liveness threads for `session`.
    pub fn spawn<R: Read + Send + 'static>(session: LinkSession, reader: R) -> Self {
        let id = session.id().clone();
        let interval = session.conf().liveness_check_interval();
        let session = Arc::new(Mutex::new(session));
        let closer = Closer::new();

        let reader = spawn_reader(
            id.clone(),
            session.clone(),
            reader,
            closer.to_closable(),
        );
        let ticker = spawn_ticker(id.clone(), session.clone(), interval, closer.to_closable());

        log::debug!("[{id}] link runner started");

        Self {
            id,
            session,
            closer,
            reader,
            ticker,
        }
    }

    /// Transport identity of the running session.
    pub fn id(&self) -> &TransportId {
        &self.id
    }

    /// Shared session.
    pub fn session(&self) -> Arc<Mutex<LinkSession>> {
        self.session.clone()
    }

    /// Runs `f` with exclusive access to the session.
    pub fn with_session<T>(&self, f: impl FnOnce(&mut LinkSession) -> T) -> Result<T> {
        let mut session = self.session.lock()?;
        Ok(f(&mut session))
    }

    /// Returns `true` once both threads have finished.
    pub fn is_finished(&self) -> bool {
        self.reader.is_finished() && self.ticker.is_finished()
    }

    /// Stops the runner and returns the session.
    ///
    /// Waits for both threads to finish.
    pub fn close(mut self) -> Result<LinkSession> {
        self.closer.close();

        if self.ticker.join().is_err() || self.reader.join().is_err() {
            return Err(Error::Poisoned);
        }
        log::debug!("[{}] link runner stopped", self.id);

        let session = Arc::try_unwrap(self.session).map_err(|_| Error::Poisoned)?;
        Ok(session.into_inner()?)
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    id: TransportId,
    session: Arc<Mutex<LinkSession>>,
    mut reader: R,
    state: Closable,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = [0u8; READ_BUFFER_SIZE];

        while !state.is_closed() {
            let bytes_read = match reader.read(&mut buf) {
                Ok(0) => {
                    log::debug!("[{id}] end of stream");
                    break;
                }
                Ok(bytes_read) => bytes_read,
                Err(err) => match err.kind() {
                    ErrorKind::TimedOut | ErrorKind::Interrupted => continue,
                    ErrorKind::WouldBlock => {
                        thread::sleep(WOULD_BLOCK_BACKOFF);
                        continue;
                    }
                    _ => {
                        log::warn!("[{id}] read failed: {err}");
                        break;
                    }
                },
            };

            match session.lock() {
                Ok(mut session) => session.receive_bytes(&buf[..bytes_read]),
                Err(_) => {
                    log::error!("[{id}] session lock is poisoned, stopping reader");
                    break;
                }
            }
        }

        log::trace!("[{id}] reader stopped");
    })
}

fn spawn_ticker(
    id: TransportId,
    session: Arc<Mutex<LinkSession>>,
    interval: Duration,
    state: Closable,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !state.is_closed() {
            thread::sleep(interval);

            match session.lock() {
                Ok(mut session) => session.check_liveness(),
                Err(_) => {
                    log::error!("[{id}] session lock is poisoned, stopping liveness checks");
                    break;
                }
            }
        }

        log::trace!("[{id}] liveness checks stopped");
    })
}
