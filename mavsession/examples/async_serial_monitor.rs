use std::sync::Arc;

use tokio_stream::StreamExt;

use mavsession::asnc::{open_serial, LinkDriver, TokioClock};
use mavsession::consts::DEFAULT_HEARTBEAT_INTERVAL;
use mavsession::protocol::{Heartbeat, StatusText};
use mavsession::session::IncomingMessage;

use mavsession::prelude::*;

#[cfg(target_os = "windows")]
const DEVICE_PREFIX: &str = "COM";
#[cfg(target_os = "macos")]
const DEVICE_PREFIX: &str = "/dev/tty.usbserial";
#[cfg(target_os = "linux")]
const DEVICE_PREFIX: &str = "/dev/ttyUSB";
#[cfg(all(not(target_os = "macos"), not(target_os = "linux"), unix))]
const DEVICE_PREFIX: &str = "/dev/tty";
const BAUD_RATE: u32 = 57_600;

fn lookup() -> Option<String> {
    tokio_serial::available_ports()
        .ok()?
        .into_iter()
        .map(|port| port.port_name)
        .find(|name| name.starts_with(DEVICE_PREFIX))
}

async fn run(path: &str) -> Result<()> {
    log::warn!("[serial] connecting to {path}");

    let (transport, reader) = open_serial(path, BAUD_RATE)?;
    let session = LinkSession::new(path, &LinkConf::default(), transport, Arc::new(TokioClock));
    let driver = LinkDriver::spawn(session, reader);
    let mut events = driver.events();
    let mut heartbeats = tokio::time::interval(DEFAULT_HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            _ = heartbeats.tick() => {
                driver.with_session(|session| {
                    session.send_message(&DecodedMessage::from(Heartbeat {
                        type_: 6,
                        autopilot: 8,
                        ..Default::default()
                    }))
                })??;
            }
            event = events.next() => match event {
                Some(Event::Message(IncomingMessage {
                    system_id,
                    component_id,
                    sequence,
                    message: DecodedMessage::Heartbeat(heartbeat),
                })) => log::info!(
                    "[serial] HEARTBEAT #{sequence} from {system_id}:{component_id}: armed={}",
                    heartbeat.is_armed()
                ),
                Some(Event::Message(IncomingMessage {
                    message: DecodedMessage::StatusText(StatusText { severity, text }),
                    ..
                })) => log::info!("[serial] STATUSTEXT ({severity}): {text}"),
                Some(Event::LinkLost { silent_for }) => {
                    log::warn!("[serial] link lost, silent for {silent_for:?}");
                    break;
                }
                Some(Event::Message(_)) => {}
                Some(other) => log::warn!("[serial] {other:?}"),
                None => break,
            },
        }
    }

    driver.close().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Setup logger
    env_logger::builder()
        .filter_level(log::LevelFilter::Info) // Suppress everything below `info` for third-party modules.
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Info) // Log level for current package
        .init();

    match lookup() {
        Some(path) => {
            if let Err(err) = run(&path).await {
                log::error!("[serial] {err}");
            }
        }
        None => log::error!("[serial] no available ports"),
    }
}
