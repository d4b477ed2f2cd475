use crate::config::InstanceConfig;
use crate::error::ConnectionError;
use crate::{HostRef, RawSample};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

/// Opens sessions against a management server.
pub trait Connector: Send + Sync {
    fn connect(&self, instance: &InstanceConfig) -> Result<Box<dyn Session>, ConnectionError>;
}

/// An authenticated session.
pub trait Session: Send + Sync {
    /// Physical hosts visible to the session, host id to display name.
    fn list_hosts(&self) -> Result<BTreeMap<String, String>, ConnectionError>;

    /// Handle used to query performance statistics through this session.
    fn statistics_handle(&self) -> Result<Box<dyn StatsHandle>, ConnectionError>;
}

/// Performance statistics queries bound to a session.
pub trait StatsHandle: Send + Sync {
    fn query_entity_statistics(
        &self,
        host: &HostRef,
        stat_keys: &[String],
    ) -> Result<Vec<RawSample>, ConnectionError>;
}

/// A live session and the statistics handle obtained from it.
pub struct Connection {
    pub session: Box<dyn Session>,
    pub stats: Box<dyn StatsHandle>,
}

/// Cache key for a management server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey {
    pub host: String,
    pub port: Option<u16>,
}

impl ConnectionKey {
    pub fn new(host: &str, port: Option<u16>) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }
}

impl std::fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => write!(f, "{}", self.host),
        }
    }
}

/// Connections reused across poll cycles, one per server.
///
/// Only successful connects are cached. A cached connection stays until it is
/// evicted, normally after a call on it fails.
pub struct SessionManager {
    connector: Arc<dyn Connector>,
    connections: Mutex<HashMap<ConnectionKey, Arc<Connection>>>,
    /// Per-server gates serialising connects to the same server.
    connecting: Mutex<HashMap<ConnectionKey, Arc<Mutex<()>>>>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            connections: Mutex::new(HashMap::new()),
            connecting: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &ConnectionKey) -> Option<Arc<Connection>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn gate(&self, key: &ConnectionKey) -> Arc<Mutex<()>> {
        let mut gates = self.connecting.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(key.clone()).or_default())
    }

    /// Return the cached connection for `instance`, connecting on a miss.
    ///
    /// The cache lock is never held during I/O. Callers racing on the same
    /// server wait on that server's gate, so it is connected at most once;
    /// callers for other servers are not blocked.
    pub fn acquire(&self, instance: &InstanceConfig) -> Result<Arc<Connection>, ConnectionError> {
        let key = instance.key();
        if let Some(conn) = self.cached(&key) {
            return Ok(conn);
        }

        let gate = self.gate(&key);
        let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(conn) = self.cached(&key) {
            return Ok(conn);
        }

        tracing::debug!(host = %key, "Opening new session");
        let session = self.connector.connect(instance)?;
        let stats = session.statistics_handle()?;
        let conn = Arc::new(Connection { session, stats });
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), Arc::clone(&conn));
        tracing::info!(host = %key, "Session established");
        Ok(conn)
    }

    /// Drop the cached connection for `key`. Returns whether one was cached.
    pub fn evict(&self, key: &ConnectionKey) -> bool {
        let removed = self
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some();
        if removed {
            tracing::info!(host = %key, "Evicted cached session");
        }
        removed
    }

    pub fn contains(&self, key: &ConnectionKey) -> bool {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
