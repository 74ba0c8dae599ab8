use std::io::{self, Read};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, Once};
use std::thread;
use std::time::Duration;

use mavsession::io::{ChannelTransport, SystemClock};
use mavsession::protocol::{Frame, Heartbeat, MessageTable, Sequence};
use mavsession::sync::LinkRunner;

use mavsession::prelude::*;

static INIT_LOGGER: Once = Once::new();
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Debug;
const WAIT_DURATION: Duration = Duration::from_millis(50);
const WAIT_LONG_DURATION: Duration = Duration::from_millis(500);

fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::builder()
            // Suppress everything below `warn` for third-party modules
            .filter_level(log::LevelFilter::Warn)
            // Allow everything above `LOG_LEVEL` from current package
            .filter_module(env!("CARGO_PKG_NAME"), LOG_LEVEL)
            .is_test(true)
            .init();
    });
}

fn wait() {
    thread::sleep(WAIT_DURATION)
}

fn wait_long() {
    thread::sleep(WAIT_LONG_DURATION)
}

fn heartbeat_bytes(sequence: Sequence) -> Vec<u8> {
    let message = DecodedMessage::from(Heartbeat::default());
    Frame::from_message(sequence, 1, 1, &message, &MessageTable::new())
        .unwrap()
        .to_bytes()
}

/// Reader fed through a channel which times out like a serial port.
struct ChannelReader {
    rx: mpsc::Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

impl ChannelReader {
    fn new() -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel();
        (
            tx,
            Self {
                rx,
                pending: Vec::new(),
            },
        )
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv_timeout(Duration::from_millis(10)) {
                Ok(bytes) => self.pending = bytes,
                Err(RecvTimeoutError::Timeout) => return Err(io::ErrorKind::TimedOut.into()),
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }

        let len = buf.len().min(self.pending.len());
        buf[..len].copy_from_slice(&self.pending[..len]);
        self.pending.drain(..len);
        Ok(len)
    }
}

fn make_session(conf: &LinkConf) -> (LinkSession, Arc<Mutex<Vec<Event>>>) {
    init_logger();

    let (transport, _) = ChannelTransport::new();
    let mut session = LinkSession::new("runner", conf, transport, Arc::new(SystemClock));

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    session.subscribe(move |event, _| sink.lock().unwrap().push(event.clone()));

    (session, events)
}

#[test]
fn runner_delivers_messages() {
    let (session, events) = make_session(&LinkConf::default());
    let (tx, reader) = ChannelReader::new();
    let runner = LinkRunner::spawn(session, reader);

    let bytes = heartbeat_bytes(0);
    tx.send(bytes[..7].to_vec()).unwrap();
    tx.send(bytes[7..].to_vec()).unwrap();
    wait();

    assert!(runner.with_session(|s| s.state().is_alive()).unwrap());
    assert_eq!(events.lock().unwrap()[0], Event::LinkEstablished);

    let session = runner.close().unwrap();
    assert_eq!(session.diagnostics().messages, 1);
}

#[test]
fn runner_detects_lost_link() {
    let conf = LinkConf::builder()
        .heartbeat_timeout(Duration::from_millis(100))
        .liveness_check_interval(Duration::from_millis(10))
        .build();
    let (session, events) = make_session(&conf);
    let (tx, reader) = ChannelReader::new();
    let runner = LinkRunner::spawn(session, reader);

    tx.send(heartbeat_bytes(0)).unwrap();
    wait_long();

    let lost = events
        .lock()
        .unwrap()
        .iter()
        .filter(|event| matches!(event, Event::LinkLost { .. }))
        .count();
    assert_eq!(lost, 1);

    drop(tx);
    runner.close().unwrap();
}

#[test]
fn runner_keeps_ticking_after_end_of_stream() {
    let conf = LinkConf::builder()
        .liveness_check_interval(Duration::from_millis(10))
        .build();
    let (session, _) = make_session(&conf);
    let (tx, reader) = ChannelReader::new();
    drop(tx);

    let runner = LinkRunner::spawn(session, reader);
    wait();

    assert!(!runner.is_finished());
    runner.close().unwrap();
}
