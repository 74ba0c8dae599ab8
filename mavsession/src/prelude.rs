//! # Basic imports

pub use crate::errors::{Error, Result};
pub use crate::protocol::DecodedMessage;
pub use crate::session::{Event, LinkConf, LinkSession, SessionRegistry};
