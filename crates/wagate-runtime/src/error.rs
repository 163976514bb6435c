//! Runtime error types.

use thiserror::Error;
use wagate_core::TransportError;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The listener or HTTP client could not be set up.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// `start` was called twice.
    #[error("Runtime is already running")]
    AlreadyRunning,

    /// The operation needs a started runtime.
    #[error("Runtime is not running")]
    NotRunning,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
