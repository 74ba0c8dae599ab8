//! # Synchronous runner
//!
//! [`LinkRunner`] drives a [`LinkSession`](crate::session::LinkSession) from two background
//! threads: one reads incoming bytes from any [`Read`](std::io::Read) source (for example a
//! serial port opened by [`SerialPortConf`](crate::io::SerialPortConf)), another ticks
//! [`LinkSession::check_liveness`](crate::session::LinkSession::check_liveness) every
//! [`LinkConf::liveness_check_interval`](crate::session::LinkConf::liveness_check_interval).
//!
//! Both threads share the session through a [`Mutex`](std::sync::Mutex), so bytes and liveness
//! ticks are never processed concurrently. Subscriber callbacks run on these threads.

mod runner;

pub use runner::LinkRunner;
