//! Gateway errors and their HTTP rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Guidance returned when no session is active.
pub const NO_SESSION_MESSAGE: &str =
    "No active WhatsApp session found. Please check gateway logs.";

/// Failures a gateway route can answer with.
///
/// Every variant renders as `{"error": "<display>"}` with its status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Authorization header rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Path under `/session/` that no route matches.
    #[error("Not Found")]
    NotFound,

    /// No session is active (and none could be provisioned).
    #[error("{}", NO_SESSION_MESSAGE)]
    ServiceUnavailable,

    /// The request was malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The connection layer failed; carries the failure's string form.
    #[error("{0}")]
    Upstream(String),
}

impl GatewayError {
    /// Returns the HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for gateway routes.
pub type GatewayResult<T> = Result<T, GatewayError>;
