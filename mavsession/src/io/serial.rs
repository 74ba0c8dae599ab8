use std::time::Duration;

use serialport::SerialPort;

use crate::io::WriteTransport;

use crate::prelude::*;

/// Default read timeout for serial ports.
const SERIAL_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// <sup>`sync`</sup>
/// Serial port configuration.
///
/// Only the device path and baud rate are configured, other line settings are left to
/// [`serialport`] defaults (8N1, no flow control).
///
/// # Usage
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use mavsession::prelude::*;
/// use mavsession::io::{SerialPortConf, SystemClock};
/// use mavsession::sync::LinkRunner;
///
/// let (transport, reader) = SerialPortConf::new("/dev/tty.usbserial-0001", 57_600)
///     .open()
///     .unwrap();
///
/// let session = LinkSession::new(
///     "telemetry",
///     &LinkConf::default(),
///     transport,
///     Arc::new(SystemClock),
/// );
/// let runner = LinkRunner::spawn(session, reader);
/// ```
#[derive(Clone, Debug)]
pub struct SerialPortConf {
    path: String,
    baud_rate: u32,
    timeout: Duration,
}

impl SerialPortConf {
    /// Creates serial port configuration.
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            timeout: SERIAL_READ_TIMEOUT,
        }
    }

    /// Sets read timeout.
    ///
    /// Runners wake up at least this often to check for shutdown.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Device path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Opens the port.
    ///
    /// Returns a transport for outgoing bytes and a cloned handle to read incoming bytes from.
    pub fn open(
        &self,
    ) -> Result<(WriteTransport<Box<dyn SerialPort>>, Box<dyn SerialPort>)> {
        let port = serialport::new(self.path.as_str(), self.baud_rate)
            .timeout(self.timeout)
            .open()
            .map_err(std::io::Error::from)?;
        let reader = port.try_clone().map_err(std::io::Error::from)?;

        log::debug!(
            "[{}] serial port opened at {} baud",
            self.path,
            self.baud_rate
        );

        Ok((WriteTransport::new(port), reader))
    }
}
