//! Transport primitives shared by the gateway and the forwarding wrapper.
//!
//! Concrete implementations live in `wagate-transport`; this module only
//! defines the shapes so that `wagate-compat` can be tested without a
//! network.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TransportResult;

// =============================================================================
// Outbound JSON
// =============================================================================

/// Status and body returned by an outbound JSON POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl PostReply {
    /// Returns `true` for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Posts a JSON body to a URL.
///
/// The connection details (client, timeout) are captured inside the closure
/// so callers hold only the behaviour.
pub type PostJsonFn =
    Arc<dyn Fn(String, Value) -> BoxFuture<'static, TransportResult<PostReply>> + Send + Sync>;

// =============================================================================
// Listener Handle
// =============================================================================

/// Handle to a running listener or monitor.
///
/// Dropping the handle stops it.
#[derive(Debug)]
pub struct ListenerHandle {
    /// Unique identifier for this listener.
    pub id: String,
    shutdown_token: CancellationToken,
}

impl ListenerHandle {
    /// Creates a new listener handle.
    pub fn new(id: impl Into<String>, shutdown_token: CancellationToken) -> Self {
        Self {
            id: id.into(),
            shutdown_token,
        }
    }

    /// Returns a token that is cancelled when the listener stops.
    pub fn token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Stops the listener.
    pub fn stop(self) {
        self.shutdown_token.cancel();
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}
