use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mavsession::io::{ManualClock, Transport};
use mavsession::prelude::*;
use mavsession::protocol::{Frame, Heartbeat, MessageTable, StatusText};
use mavsession::session::TransportId;

struct NullTransport;

impl Transport for NullTransport {
    fn send(&mut self, _: &[u8]) -> std::result::Result<(), mavsession::errors::TransportError> {
        Ok(())
    }
}

fn make_stream(n_frames: usize) -> Vec<u8> {
    let table = MessageTable::new();
    let heartbeat = DecodedMessage::from(Heartbeat::default());
    let text = DecodedMessage::from(StatusText {
        severity: 6,
        text: "EKF2 IMU0 is using GPS".into(),
    });

    let mut stream = Vec::new();
    for i in 0..n_frames {
        let message = if i % 10 == 9 { &text } else { &heartbeat };
        let frame = Frame::from_message(i as u8, 1, 1, message, &table).unwrap();
        stream.extend(frame.to_bytes());
    }
    stream
}

fn report(name: &str, n_frames: usize, n_bytes: usize, elapsed: Duration) {
    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    log::info!(
        "[{name}] {n_frames} frames / {n_bytes} bytes in {elapsed:?}: {:.0} frames/s, {:.2} MiB/s",
        n_frames as f64 / secs,
        n_bytes as f64 / secs / (1024.0 * 1024.0),
    );
}

/// Pushes `n_frames` through a single session in chunks of `chunk_size` bytes.
pub fn benchmark_session_throughput(n_frames: usize, chunk_size: usize) {
    let stream = make_stream(n_frames);
    let mut session = LinkSession::new(
        "benchmark",
        &LinkConf::default(),
        NullTransport,
        Arc::new(ManualClock::new()),
    );

    let received = Arc::new(AtomicUsize::new(0));
    let counter = received.clone();
    session.subscribe(move |event, _| {
        if let Event::Message(_) = event {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    });

    let start = Instant::now();
    for chunk in stream.chunks(chunk_size.max(1)) {
        session.receive_bytes(chunk);
    }
    let elapsed = start.elapsed();

    assert_eq!(received.load(Ordering::Relaxed), n_frames);
    report("session", n_frames, stream.len(), elapsed);
}

/// Spreads `n_frames` per link over `n_links` sessions of a registry.
pub fn benchmark_registry(n_links: usize, n_frames: usize) {
    let stream = make_stream(n_frames);
    let mut registry = SessionRegistry::new(LinkConf::default(), Arc::new(ManualClock::new()));

    let ids: Vec<TransportId> = (0..n_links)
        .map(|i| TransportId::new(format!("udp:{}", 14550 + i)))
        .collect();
    for id in &ids {
        registry.open(id, NullTransport);
    }

    let start = Instant::now();
    for chunk in stream.chunks(64) {
        for id in &ids {
            registry.receive_bytes(id, chunk).unwrap();
        }
        registry.check_liveness();
    }
    let elapsed = start.elapsed();

    for id in &ids {
        let diagnostics = registry.get(id).unwrap().diagnostics();
        assert_eq!(diagnostics.messages, n_frames as u64);
        assert_eq!(diagnostics.sequence_gaps, 0);
    }
    report("registry", n_frames * n_links, stream.len() * n_links, elapsed);
}
