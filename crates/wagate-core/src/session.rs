//! Session records and the registry that owns them.
//!
//! The registry belongs to the WhatsApp connection layer. The gateway only
//! lists sessions and, on some routes, asks for a default one to be created.
//!
//! # Single-tenant selection
//!
//! The registry may hold several sessions. The gateway always operates on
//! the first one [`SessionRegistry::list_sessions`] returns; see
//! [`first_session`]. No canonical order is promised.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PairingResult, RegistryResult};

/// Connection state as reported by the WhatsApp socket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Paired and connected.
    Open,
    /// Handshake in progress.
    Connecting,
    /// Disconnected.
    Closed,
    /// Any other state string the socket reports.
    #[serde(untagged)]
    Other(String),
}

impl ConnectionState {
    /// Returns `true` for the `open` state.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns the state name as the socket spells it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Connecting => "connecting",
            Self::Closed => "closed",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for ConnectionState {
    fn from(s: &str) -> Self {
        match s {
            "open" => Self::Open,
            "connecting" => Self::Connecting,
            "close" | "closed" => Self::Closed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability to request a phone pairing code from a live socket.
#[async_trait]
pub trait PairingSocket: Send + Sync {
    /// Requests a pairing code for a digits-only phone number.
    async fn request_pairing_code(&self, phone: &str) -> PairingResult<String>;
}

/// Shared pairing socket.
pub type BoxedPairingSocket = Arc<dyn PairingSocket>;

/// A snapshot of one session in the registry.
#[derive(Clone)]
pub struct SessionRecord {
    /// Opaque session identifier.
    pub id: String,
    /// Authoritative liveness signal.
    pub connection: ConnectionState,
    /// Present only while the device waits for a scan.
    pub qr_code: Option<String>,
    /// Socket used for phone pairing.
    pub socket: BoxedPairingSocket,
}

impl SessionRecord {
    /// Creates a record in the `connecting` state with no QR code.
    pub fn new(id: impl Into<String>, socket: BoxedPairingSocket) -> Self {
        Self {
            id: id.into(),
            connection: ConnectionState::Connecting,
            qr_code: None,
            socket,
        }
    }

    /// Sets the connection state.
    pub fn with_connection(mut self, connection: ConnectionState) -> Self {
        self.connection = connection;
        self
    }

    /// Sets the QR code.
    pub fn with_qr_code(mut self, qr: impl Into<String>) -> Self {
        self.qr_code = Some(qr.into());
        self
    }

    /// Returns the QR code if one is present and non-empty.
    pub fn qr(&self) -> Option<&str> {
        self.qr_code.as_deref().filter(|qr| !qr.is_empty())
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("id", &self.id)
            .field("connection", &self.connection)
            .field("qr_code", &self.qr_code)
            .finish_non_exhaustive()
    }
}

/// The session registry owned by the connection layer.
///
/// Implementations must tolerate concurrent callers. The gateway performs no
/// compare-and-swap: two concurrent `create_default_session` calls may both
/// succeed.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Lists the sessions currently known, in registry order.
    async fn list_sessions(&self) -> Vec<SessionRecord>;

    /// Creates the default session.
    async fn create_default_session(&self) -> RegistryResult<SessionRecord>;
}

/// Shared session registry.
pub type BoxedSessionRegistry = Arc<dyn SessionRegistry>;

/// Returns the active session: whatever the registry lists first.
pub async fn first_session(registry: &dyn SessionRegistry) -> Option<SessionRecord> {
    registry.list_sessions().await.into_iter().next()
}
