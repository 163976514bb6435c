//! Unified error types for the wagate core.
//!
//! Each collaborator boundary gets its own error enum. Gateway-level errors
//! (the ones that turn into HTTP responses) live in `wagate-compat`.

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Binding a listener failed.
    #[error("failed to bind {addr}: {reason}")]
    BindFailed {
        /// The address that could not be bound.
        addr: String,
        /// Reason for failure.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised by a [`SessionRegistry`](crate::SessionRegistry).
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The connection layer could not create a session.
    #[error("failed to create session: {0}")]
    CreationFailed(String),

    /// The registry is not accepting requests.
    #[error("session registry unavailable: {0}")]
    Unavailable(String),
}

impl RegistryError {
    /// Creates a creation error.
    pub fn creation(msg: impl Into<String>) -> Self {
        Self::CreationFailed(msg.into())
    }
}

// =============================================================================
// Pairing Errors
// =============================================================================

/// Errors raised by a [`PairingSocket`](crate::PairingSocket).
///
/// Callers only ever see the `Display` form; no structure is preserved past
/// the gateway boundary.
#[derive(Debug, Clone, Error)]
pub enum PairingError {
    /// The server refused to issue a code.
    #[error("pairing rejected: {0}")]
    Rejected(String),

    /// The socket is not connected to the server.
    #[error("socket is not connected")]
    NotConnected,

    /// The request did not complete in time.
    #[error("pairing request timed out")]
    Timeout,
}

// =============================================================================
// Forwarding Errors
// =============================================================================

/// Errors that can occur while forwarding an inbound message.
///
/// These never leave the forwarding wrapper; they are logged and dropped.
#[derive(Debug, Clone, Error)]
pub enum ForwardError {
    /// The payload could not be serialized.
    #[error("failed to serialize payload: {0}")]
    Serialize(String),

    /// The request could not be sent.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request did not finish within the forwarding deadline.
    #[error("forwarding timed out after {0:?}")]
    Timeout(Duration),

    /// The destination answered with a non-success status.
    #[error("destination answered HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
}

impl From<serde_json::Error> for ForwardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for pairing requests.
pub type PairingResult<T> = Result<T, PairingError>;

/// Result type for forwarding.
pub type ForwardResult<T> = Result<T, ForwardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_error_display() {
        assert_eq!(
            PairingError::Rejected("rate limited".into()).to_string(),
            "pairing rejected: rate limited"
        );
        assert_eq!(PairingError::NotConnected.to_string(), "socket is not connected");
    }

    #[test]
    fn test_forward_error_from_transport() {
        let err: ForwardError = TransportError::Io("connection refused".into()).into();
        assert_eq!(err.to_string(), "I/O error: connection refused");
    }
}
