//! Link session configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::consts::{
    DEFAULT_COMPONENT_ID, DEFAULT_HEARTBEAT_TIMEOUT, DEFAULT_LIVENESS_CHECK_INTERVAL,
    DEFAULT_MAX_STALLED_CHUNKS, DEFAULT_SYSTEM_ID,
};
use crate::protocol::{ComponentId, MessageTable, SystemId};

/// Link session configuration.
///
/// Configurations are dormant and can be cloned, so a single configuration may be used to
/// create many sessions.
///
/// ```rust
/// use std::time::Duration;
/// use mavsession::session::LinkConf;
///
/// let conf = LinkConf::builder()
///     .system_id(10)
///     .component_id(42)
///     .heartbeat_timeout(Duration::from_secs(5))
///     .build();
///
/// assert_eq!(conf.system_id(), 10);
/// assert_eq!(conf.component_id(), 42);
/// assert_eq!(conf.heartbeat_timeout(), Duration::from_secs(5));
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConf {
    pub(crate) system_id: SystemId,
    pub(crate) component_id: ComponentId,
    pub(crate) heartbeat_timeout: Duration,
    pub(crate) liveness_check_interval: Duration,
    pub(crate) max_stalled_chunks: usize,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) message_table: Arc<MessageTable>,
}

impl LinkConf {
    /// Creates a [`LinkConfBuilder`] populated with defaults.
    pub fn builder() -> LinkConfBuilder {
        LinkConfBuilder::new()
    }

    /// Creates a [`LinkConfBuilder`] initialised with current configuration.
    pub fn update(self) -> LinkConfBuilder {
        LinkConfBuilder { conf: self }
    }

    /// System `ID` used for outgoing frames.
    #[inline(always)]
    pub fn system_id(&self) -> SystemId {
        self.system_id
    }

    /// Component `ID` used for outgoing frames.
    #[inline(always)]
    pub fn component_id(&self) -> ComponentId {
        self.component_id
    }

    /// Timeout for MAVLink heartbeats.
    ///
    /// If a peer hasn't sent heartbeats for as long as the specified duration, the link is
    /// considered lost.
    ///
    /// Default timeout is [`DEFAULT_HEARTBEAT_TIMEOUT`].
    pub fn heartbeat_timeout(&self) -> Duration {
        self.heartbeat_timeout
    }

    /// Interval at which runners call
    /// [`LinkSession::check_liveness`](crate::session::LinkSession::check_liveness).
    ///
    /// Default interval is [`DEFAULT_LIVENESS_CHECK_INTERVAL`].
    pub fn liveness_check_interval(&self) -> Duration {
        self.liveness_check_interval
    }

    /// Number of consecutive chunks an incomplete frame may wait before it is dropped.
    pub fn max_stalled_chunks(&self) -> usize {
        self.max_stalled_chunks
    }

    /// Message table used to validate and decode frames.
    pub fn message_table(&self) -> &Arc<MessageTable> {
        &self.message_table
    }
}

impl Default for LinkConf {
    fn default() -> Self {
        Self {
            system_id: DEFAULT_SYSTEM_ID,
            component_id: DEFAULT_COMPONENT_ID,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            liveness_check_interval: DEFAULT_LIVENESS_CHECK_INTERVAL,
            max_stalled_chunks: DEFAULT_MAX_STALLED_CHUNKS,
            message_table: Arc::new(MessageTable::new()),
        }
    }
}

/// Builder for [`LinkConf`].
#[derive(Clone, Debug, Default)]
pub struct LinkConfBuilder {
    conf: LinkConf,
}

impl LinkConfBuilder {
    /// Creates a builder populated with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets system `ID` for outgoing frames.
    pub fn system_id(mut self, system_id: SystemId) -> Self {
        self.conf.system_id = system_id;
        self
    }

    /// Sets component `ID` for outgoing frames.
    pub fn component_id(mut self, component_id: ComponentId) -> Self {
        self.conf.component_id = component_id;
        self
    }

    /// Sets heartbeat timeout.
    pub fn heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.conf.heartbeat_timeout = timeout;
        self
    }

    /// Sets liveness check interval.
    pub fn liveness_check_interval(mut self, interval: Duration) -> Self {
        self.conf.liveness_check_interval = interval;
        self
    }

    /// Sets how many consecutive chunks an incomplete frame may wait before it is dropped.
    pub fn max_stalled_chunks(mut self, chunks: usize) -> Self {
        self.conf.max_stalled_chunks = chunks;
        self
    }

    /// Sets message table.
    ///
    /// Use it to register `CRC_EXTRA` of custom messages with [`MessageTable::with_crc_extra`].
    pub fn message_table(mut self, table: MessageTable) -> Self {
        self.conf.message_table = Arc::new(table);
        self
    }

    /// Builds configuration.
    pub fn build(self) -> LinkConf {
        self.conf
    }
}
