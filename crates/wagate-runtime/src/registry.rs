//! In-memory session registry.
//!
//! For hosts without a connection layer of their own. Sessions are kept in
//! insertion order, so the first one inserted is the active one. The
//! connection layer reports progress through [`set_connection_state`] and
//! [`set_qr_code`]; new sockets come from a [`SocketFactory`].
//!
//! [`set_connection_state`]: MemorySessionRegistry::set_connection_state
//! [`set_qr_code`]: MemorySessionRegistry::set_qr_code

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use wagate_core::{
    BoxedPairingSocket, ConnectionState, RegistryError, RegistryResult, SessionRecord,
    SessionRegistry,
};

/// Id given to the session created on demand.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Opens sockets for new sessions.
#[async_trait]
pub trait SocketFactory: Send + Sync {
    /// Opens a socket for `session_id`.
    async fn create_socket(&self, session_id: &str) -> RegistryResult<BoxedPairingSocket>;
}

/// Shared socket factory.
pub type BoxedSocketFactory = Arc<dyn SocketFactory>;

/// Session registry held in memory.
pub struct MemorySessionRegistry {
    sessions: RwLock<Vec<SessionRecord>>,
    factory: Option<BoxedSocketFactory>,
    default_id: String,
}

impl MemorySessionRegistry {
    /// Creates an empty registry that opens sockets through `factory`.
    pub fn new(factory: BoxedSocketFactory) -> Self {
        Self {
            sessions: RwLock::new(Vec::new()),
            factory: Some(factory),
            default_id: DEFAULT_SESSION_ID.to_string(),
        }
    }

    /// Creates an empty registry that cannot create sessions itself.
    pub fn without_factory() -> Self {
        Self {
            sessions: RwLock::new(Vec::new()),
            factory: None,
            default_id: DEFAULT_SESSION_ID.to_string(),
        }
    }

    /// Sets the id used by [`create_default_session`](SessionRegistry::create_default_session).
    pub fn with_default_id(mut self, id: impl Into<String>) -> Self {
        self.default_id = id.into();
        self
    }

    /// Inserts a session, replacing any with the same id in place.
    pub async fn insert(&self, record: SessionRecord) {
        let mut sessions = self.sessions.write().await;
        match sessions.iter_mut().find(|s| s.id == record.id) {
            Some(existing) => *existing = record,
            None => {
                debug!(session = %record.id, "Session registered");
                sessions.push(record);
            }
        }
    }

    /// Removes a session. Returns it if it existed.
    pub async fn remove(&self, id: &str) -> Option<SessionRecord> {
        let mut sessions = self.sessions.write().await;
        let index = sessions.iter().position(|s| s.id == id)?;
        info!(session = %id, "Session removed");
        Some(sessions.remove(index))
    }

    /// Updates a session's connection state. Returns whether it exists.
    ///
    /// Reaching `open` clears the QR code.
    pub async fn set_connection_state(&self, id: &str, state: ConnectionState) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if state.is_open() {
            session.qr_code = None;
        }
        debug!(session = %id, from = %session.connection, to = %state, "Connection state changed");
        session.connection = state;
        true
    }

    /// Sets or clears a session's QR code. Returns whether it exists.
    pub async fn set_qr_code(&self, id: &str, qr_code: Option<String>) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        session.qr_code = qr_code;
        true
    }

    /// Returns a session by id.
    pub async fn get(&self, id: &str) -> Option<SessionRecord> {
        self.sessions.read().await.iter().find(|s| s.id == id).cloned()
    }

    /// Returns the number of sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if there are no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Returns session counts per state.
    pub async fn stats(&self) -> RegistryStats {
        let sessions = self.sessions.read().await;
        let mut stats = RegistryStats {
            total: sessions.len(),
            ..Default::default()
        };
        for session in sessions.iter() {
            match session.connection {
                ConnectionState::Open => stats.open += 1,
                ConnectionState::Connecting => stats.connecting += 1,
                ConnectionState::Closed => stats.closed += 1,
                ConnectionState::Other(_) => {}
            }
        }
        stats
    }
}

#[async_trait]
impl SessionRegistry for MemorySessionRegistry {
    async fn list_sessions(&self) -> Vec<SessionRecord> {
        self.sessions.read().await.clone()
    }

    async fn create_default_session(&self) -> RegistryResult<SessionRecord> {
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| RegistryError::Unavailable("no socket factory configured".into()))?;

        let socket = factory.create_socket(&self.default_id).await?;
        let record = SessionRecord::new(self.default_id.clone(), socket);
        self.insert(record.clone()).await;
        info!(session = %record.id, "Session created");
        Ok(record)
    }
}

impl std::fmt::Debug for MemorySessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionRegistry")
            .field("default_id", &self.default_id)
            .field("has_factory", &self.factory.is_some())
            .finish_non_exhaustive()
    }
}

/// Session counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// All sessions.
    pub total: usize,
    /// Sessions in `open`.
    pub open: usize,
    /// Sessions in `connecting`.
    pub connecting: usize,
    /// Sessions in `closed`.
    pub closed: usize,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use wagate_core::{PairingResult, PairingSocket};

    use super::*;

    struct EchoSocket;

    #[async_trait]
    impl PairingSocket for EchoSocket {
        async fn request_pairing_code(&self, phone: &str) -> PairingResult<String> {
            Ok(format!("code-{phone}"))
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SocketFactory for CountingFactory {
        async fn create_socket(&self, _session_id: &str) -> RegistryResult<BoxedPairingSocket> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RegistryError::creation("auth state missing"))
            } else {
                Ok(Arc::new(EchoSocket))
            }
        }
    }

    #[tokio::test]
    async fn test_create_default_session() {
        let factory = Arc::new(CountingFactory::default());
        let registry = MemorySessionRegistry::new(factory.clone());

        let record = registry.create_default_session().await.unwrap();
        assert_eq!(record.id, DEFAULT_SESSION_ID);
        assert_eq!(record.connection, ConnectionState::Connecting);
        assert_eq!(registry.len().await, 1);
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);

        let code = record.socket.request_pairing_code("123").await.unwrap();
        assert_eq!(code, "code-123");
    }

    #[tokio::test]
    async fn test_failed_create_leaves_registry_empty() {
        let factory = Arc::new(CountingFactory {
            fail: true,
            ..Default::default()
        });
        let registry = MemorySessionRegistry::new(factory);
        assert!(registry.create_default_session().await.is_err());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_without_factory_is_unavailable() {
        let registry = MemorySessionRegistry::without_factory();
        assert!(matches!(
            registry.create_default_session().await,
            Err(RegistryError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_insertion_order_and_replace() {
        let registry = MemorySessionRegistry::without_factory();
        registry.insert(SessionRecord::new("a", Arc::new(EchoSocket))).await;
        registry.insert(SessionRecord::new("b", Arc::new(EchoSocket))).await;
        registry
            .insert(SessionRecord::new("a", Arc::new(EchoSocket)).with_qr_code("QR"))
            .await;

        let ids: Vec<_> = registry.list_sessions().await.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(registry.get("a").await.unwrap().qr(), Some("QR"));
    }

    #[tokio::test]
    async fn test_state_updates() {
        let registry = MemorySessionRegistry::without_factory().with_default_id("main");
        registry.insert(SessionRecord::new("main", Arc::new(EchoSocket))).await;

        assert!(registry.set_qr_code("main", Some("2@abc".into())).await);
        assert_eq!(registry.get("main").await.unwrap().qr(), Some("2@abc"));

        assert!(registry.set_connection_state("main", ConnectionState::Open).await);
        let session = registry.get("main").await.unwrap();
        assert!(session.connection.is_open());
        assert_eq!(session.qr(), None);

        assert!(!registry.set_qr_code("missing", None).await);
        assert!(!registry.set_connection_state("missing", ConnectionState::Closed).await);

        let stats = registry.stats().await;
        assert_eq!(stats.total, 1);
        assert_eq!(stats.open, 1);

        assert!(registry.remove("main").await.is_some());
        assert!(registry.remove("main").await.is_none());
    }
}
