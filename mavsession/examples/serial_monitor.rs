use std::sync::Arc;
use std::sync::mpsc;
use std::time::Instant;

use mavsession::consts::DEFAULT_HEARTBEAT_INTERVAL;
use mavsession::io::{SerialPortConf, SystemClock};
use mavsession::protocol::{Heartbeat, StatusText};
use mavsession::session::IncomingMessage;
use mavsession::sync::LinkRunner;

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
const N_HEARTBEATS: usize = 30;

fn lookup() -> Option<String> {
    let ports = serialport::available_ports().ok()?;
    log::warn!(
        "Got ports: {:?}",
        ports
            .iter()
            .map(|p| p.port_name.clone())
            .collect::<Vec<_>>()
    );
    ports
        .into_iter()
        .map(|port| port.port_name)
        .find(|name| name.starts_with(DEVICE_PREFIX))
}

fn report(event: &Event) {
    match event {
        Event::Message(IncomingMessage {
            system_id,
            component_id,
            sequence,
            message: DecodedMessage::Heartbeat(heartbeat),
        }) => log::info!(
            "[serial] HEARTBEAT #{sequence} from {system_id}:{component_id}: type={} autopilot={} armed={}",
            heartbeat.type_,
            heartbeat.autopilot,
            heartbeat.is_armed()
        ),
        Event::Message(IncomingMessage {
            message: DecodedMessage::StatusText(StatusText { severity, text }),
            ..
        }) => log::info!("[serial] STATUSTEXT ({severity}): {text}"),
        Event::Message(_) => {}
        other => log::warn!("[serial] {other:?}"),
    }
}

fn run(path: &str) -> Result<()> {
    log::warn!("[serial] connecting to {path}");

    let (transport, reader) = SerialPortConf::new(path, BAUD_RATE).open()?;
    let mut session = LinkSession::new(path, &LinkConf::default(), transport, Arc::new(SystemClock));

    let (tx, rx) = mpsc::channel();
    session.subscribe(move |event, subscription| {
        if tx.send(event.clone()).is_err() {
            subscription.unsubscribe();
        }
    });

    let runner = LinkRunner::spawn(session, reader);

    for _ in 0..N_HEARTBEATS {
        runner.with_session(|session| {
            session.send_message(&DecodedMessage::from(Heartbeat {
                type_: 6,
                autopilot: 8,
                ..Default::default()
            }))
        })??;

        let deadline = Instant::now() + DEFAULT_HEARTBEAT_INTERVAL;
        while let Ok(event) = rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            report(&event);
        }
    }

    let session = runner.close()?;
    log::warn!("[serial] finished: {:?}", session.diagnostics());

    Ok(())
}

fn main() {
    // Setup logger
    env_logger::builder()
        .filter_level(log::LevelFilter::Info) // Suppress everything below `info` for third-party modules.
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Info) // Log level for current package
        .init();

    match lookup() {
        Some(path) => {
            if let Err(err) = run(&path) {
                log::error!("[serial] {err}");
            }
        }
        None => log::error!("[serial] no available ports"),
    }
}
