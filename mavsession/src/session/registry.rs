//! Registry of concurrent link sessions.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::io::{Clock, SystemClock, Transport};
use crate::session::{LinkConf, LinkSession, TransportId};

use crate::prelude::*;

/// Sessions keyed by transport identity.
///
/// All sessions opened by a registry share its [`LinkConf`] and [`Clock`].
///
/// ```rust
/// use mavsession::prelude::*;
/// use mavsession::io::ChannelTransport;
///
/// let mut registry = SessionRegistry::default();
///
/// let (transport, _) = ChannelTransport::new();
/// registry.open("udp:14550", transport);
/// assert!(registry.contains(&"udp:14550".into()));
///
/// assert!(registry.close(&"udp:14550".into()));
/// assert!(registry.is_empty());
/// ```
#[derive(Debug)]
pub struct SessionRegistry {
    conf: LinkConf,
    clock: Arc<dyn Clock>,
    sessions: BTreeMap<TransportId, LinkSession>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new(conf: LinkConf, clock: Arc<dyn Clock>) -> Self {
        Self {
            conf,
            clock,
            sessions: BTreeMap::new(),
        }
    }

    /// Configuration applied to new sessions.
    pub fn conf(&self) -> &LinkConf {
        &self.conf
    }

    /// Returns the session for `id` creating it if absent.
    ///
    /// If a session already exists, `transport` is dropped and the existing session is returned
    /// untouched.
    pub fn open(
        &mut self,
        id: impl Into<TransportId>,
        transport: impl Transport + 'static,
    ) -> &mut LinkSession {
        let id = id.into();
        let conf = &self.conf;
        let clock = &self.clock;

        self.sessions.entry(id).or_insert_with_key(|id| {
            log::debug!("[{id}] registering session");
            LinkSession::new(id, conf, transport, clock.clone())
        })
    }

    /// Closes and removes the session for `id`.
    ///
    /// Returns `false` if there was no such session.
    pub fn close(&mut self, id: &TransportId) -> bool {
        match self.sessions.remove(id) {
            Some(session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Session for `id`.
    pub fn get(&self, id: &TransportId) -> Option<&LinkSession> {
        self.sessions.get(id)
    }

    /// Mutable session for `id`.
    pub fn get_mut(&mut self, id: &TransportId) -> Option<&mut LinkSession> {
        self.sessions.get_mut(id)
    }

    /// Returns `true` if a session for `id` is open.
    pub fn contains(&self, id: &TransportId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Identities of open sessions in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &TransportId> {
        self.sessions.keys()
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no open sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Routes incoming bytes to the session for `id`.
    pub fn receive_bytes(&mut self, id: &TransportId, bytes: &[u8]) -> Result<()> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| Error::UnknownTransport(id.clone()))?;
        session.receive_bytes(bytes);
        Ok(())
    }

    /// Checks liveness of every open session.
    pub fn check_liveness(&mut self) {
        for session in self.sessions.values_mut() {
            session.check_liveness();
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(LinkConf::default(), Arc::new(SystemClock))
    }
}
