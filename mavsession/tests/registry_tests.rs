use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use mavsession::io::{ChannelTransport, ManualClock};
use mavsession::protocol::{Frame, Heartbeat, MessageTable, Sequence};
use mavsession::session::TransportId;

use mavsession::prelude::*;

static INIT_LOGGER: Once = Once::new();
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Debug;

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

fn heartbeat_bytes(sequence: Sequence) -> Vec<u8> {
    let message = DecodedMessage::from(Heartbeat::default());
    Frame::from_message(sequence, 1, 1, &message, &MessageTable::new())
        .unwrap()
        .to_bytes()
}

fn make_registry() -> (SessionRegistry, ManualClock) {
    init_logger();
    let clock = ManualClock::new();
    let conf = LinkConf::builder()
        .heartbeat_timeout(Duration::from_secs(2))
        .build();
    (SessionRegistry::new(conf, Arc::new(clock.clone())), clock)
}

#[test]
fn sessions_are_independent() {
    let (mut registry, _) = make_registry();
    let serial = TransportId::new("/dev/ttyUSB0");
    let udp = TransportId::new("udp:14550");

    registry.open(&serial, ChannelTransport::new().0);
    registry.open(&udp, ChannelTransport::new().0);

    let bytes = heartbeat_bytes(0);
    registry.receive_bytes(&serial, &bytes[..10]).unwrap();
    registry.receive_bytes(&udp, &bytes[..5]).unwrap();
    registry.receive_bytes(&serial, &bytes[10..]).unwrap();

    assert!(registry.get(&serial).unwrap().state().is_alive());
    assert!(!registry.get(&udp).unwrap().state().is_alive());

    registry.receive_bytes(&udp, &bytes[5..]).unwrap();
    assert!(registry.get(&udp).unwrap().state().is_alive());
}

#[test]
fn liveness_is_checked_for_every_session() {
    let (mut registry, clock) = make_registry();
    let lost = Arc::new(Mutex::new(Vec::new()));

    for id in ["a", "b", "c"] {
        let sink = lost.clone();
        let session = registry.open(id, ChannelTransport::new().0);
        session.subscribe(move |event, _| {
            if let Event::LinkLost { .. } = event {
                sink.lock().unwrap().push(id);
            }
        });
        if id != "c" {
            session.receive_bytes(&heartbeat_bytes(0));
        }
    }

    clock.advance(Duration::from_secs(2));
    registry.check_liveness();
    registry.check_liveness();

    assert_eq!(*lost.lock().unwrap(), vec!["a", "b"]);
}

#[test]
fn closed_sessions_release_transport() {
    let (mut registry, _) = make_registry();
    let (transport, outgoing) = ChannelTransport::new();

    registry
        .open("a", transport)
        .send_command(&[1, 2, 3])
        .unwrap();
    assert_eq!(outgoing.recv().unwrap(), vec![1, 2, 3]);

    assert!(registry.close(&"a".into()));
    assert!(registry.is_empty());
    assert!(outgoing.recv().is_err());

    assert!(matches!(
        registry.receive_bytes(&"a".into(), &[0xFE]),
        Err(Error::UnknownTransport(_))
    ));
}

#[test]
fn sessions_can_be_reached_mutably() {
    let (mut registry, _) = make_registry();
    registry.open("a", ChannelTransport::new().0);

    let id = TransportId::new("a");
    let session = registry.get_mut(&id).unwrap();
    session.receive_bytes(&heartbeat_bytes(3));

    assert!(registry.contains(&id));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.ids().collect::<Vec<_>>(), vec![&id]);
    assert_eq!(registry.get(&id).unwrap().state().last_sequence(), Some(3));
}
