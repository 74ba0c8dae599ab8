use std::sync::{Arc, Once};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_stream::StreamExt;

use mavsession::asnc::{LinkDriver, TokioClock, WriterTransport};
use mavsession::protocol::{Frame, Heartbeat, MessageTable, Sequence};
use mavsession::session::IncomingMessage;

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

#[tokio::test(start_paused = true)]
async fn driver_reports_link_lifecycle() {
    init_logger();

    let (mut device, link) = tokio::io::duplex(1024);
    let (link_reader, link_writer) = tokio::io::split(link);

    let session = LinkSession::new(
        "duplex",
        &LinkConf::default(),
        WriterTransport::spawn(link_writer),
        Arc::new(TokioClock),
    );
    let driver = LinkDriver::spawn(session, link_reader);
    let mut events = driver.events();

    device.write_all(&heartbeat_bytes(0)).await.unwrap();
    assert_eq!(events.next().await, Some(Event::LinkEstablished));
    assert!(matches!(
        events.next().await,
        Some(Event::Message(IncomingMessage { sequence: 0, .. }))
    ));

    // Paused clock advances straight to the liveness tick that detects the loss
    match events.next().await {
        Some(Event::LinkLost { silent_for }) => {
            assert!(silent_for >= Duration::from_secs(3));
            assert!(silent_for < Duration::from_secs(4));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    device.write_all(&heartbeat_bytes(1)).await.unwrap();
    assert_eq!(events.next().await, Some(Event::LinkRecovered));

    driver.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn driver_sends_through_writer() {
    init_logger();

    let (mut device, link) = tokio::io::duplex(1024);
    let (link_reader, link_writer) = tokio::io::split(link);

    let conf = LinkConf::builder().system_id(9).component_id(1).build();
    let session = LinkSession::new(
        "duplex",
        &conf,
        WriterTransport::spawn(link_writer),
        Arc::new(TokioClock),
    );
    let driver = LinkDriver::spawn(session, link_reader);

    let sequence = driver
        .with_session(|session| session.send_message(&DecodedMessage::from(Heartbeat::default())))
        .unwrap()
        .unwrap();
    assert_eq!(sequence, 0);

    let mut buf = [0u8; 17];
    device.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf[..6], &[0xFE, 9, 0, 9, 1, 0]);

    driver.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn driver_survives_end_of_stream() {
    init_logger();

    let (device, link) = tokio::io::duplex(1024);
    drop(device);

    let (transport, _) = mavsession::io::ChannelTransport::new();
    let session = LinkSession::new("closed", &LinkConf::default(), transport, Arc::new(TokioClock));
    let driver = LinkDriver::spawn(session, link);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!driver.is_finished());

    driver.close().await.unwrap();
}
