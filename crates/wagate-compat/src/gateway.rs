//! The compatibility gateway.
//!
//! One [`CompatGateway`] answers `/webhook` and `/session/*` for a single
//! [`Vocabulary`] and declines everything else, so it can share a listener
//! with other handlers.
//!
//! ```text
//! request ─▶ Route::classify ─▶ authorize ─▶ resolve_session ─▶ translate / pair
//!               │ None              │ 403          │ 503
//!               ▼                   ▼              ▼
//!           Declined           {"error":..}   {"error":..}
//! ```

use async_trait::async_trait;
use axum::{
    Json,
    body::to_bytes,
    extract::Request,
    http::header::AUTHORIZATION,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use wagate_core::{BoxedSessionRegistry, SessionRecord};
use wagate_transport::{Dispatch, RequestHandler};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::pairing;
use crate::provision::resolve_session;
use crate::route::Route;
use crate::status::ExternalStatus;
use crate::vocabulary::Vocabulary;

/// Largest pairing body read; longer bodies count as empty.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Id reported by `/session/status`.
const STATUS_ID: &str = "default";

const NO_QR_MESSAGE: &str = "No QR code available (maybe already connected?)";

/// Session compatibility gateway for one client vocabulary.
#[derive(Clone)]
pub struct CompatGateway {
    vocabulary: Vocabulary,
    admin_token: String,
    registry: BoxedSessionRegistry,
}

impl CompatGateway {
    /// Creates a gateway with an empty admin token.
    pub fn new(vocabulary: Vocabulary, registry: BoxedSessionRegistry) -> Self {
        Self {
            vocabulary,
            admin_token: String::new(),
            registry,
        }
    }

    /// Creates a gateway from configuration.
    pub fn from_config(config: &GatewayConfig, registry: BoxedSessionRegistry) -> Self {
        Self::new(config.vocabulary, registry).with_admin_token(config.admin_token.clone())
    }

    /// Sets the admin token. Empty disables the check.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = token.into();
        self
    }

    /// Returns the vocabulary served.
    pub fn vocabulary(&self) -> Vocabulary {
        self.vocabulary
    }

    async fn serve(&self, route: Route, request: Request) -> GatewayResult<Response> {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !self.vocabulary.authorize(header, &self.admin_token) {
            debug!(
                vocabulary = %self.vocabulary,
                path = %request.uri().path(),
                "Rejected unauthorized request"
            );
            return Err(GatewayError::Unauthorized);
        }

        match route {
            Route::Webhook | Route::HmacConfig => Ok(Json(json!({ "status": "success" })).into_response()),
            Route::UnknownSession => Err(GatewayError::NotFound),
            Route::Qr => {
                let session = self.active_session(route).await?;
                let body = match session.qr() {
                    Some(qr) => json!({ "data": { "QRCode": qr } }),
                    None => json!({ "data": { "QRCode": "" }, "message": NO_QR_MESSAGE }),
                };
                Ok(Json(body).into_response())
            }
            Route::Status => {
                let session = self.active_session(route).await?;
                let status = ExternalStatus::of(&session);
                Ok(Json(json!({ "status": status, "id": STATUS_ID })).into_response())
            }
            Route::PairPhone => {
                let session = self.active_session(route).await?;
                let body = to_bytes(request.into_body(), MAX_BODY_BYTES)
                    .await
                    .unwrap_or_default();
                let code = pairing::request_code(&session, &body).await?;
                Ok(Json(json!({ "LinkingCode": code })).into_response())
            }
        }
    }

    async fn active_session(&self, route: Route) -> GatewayResult<SessionRecord> {
        let provision = route.may_provision() && self.vocabulary.auto_provisions();
        resolve_session(self.registry.as_ref(), provision)
            .await
            .ok_or(GatewayError::ServiceUnavailable)
    }
}

#[async_trait]
impl RequestHandler for CompatGateway {
    async fn handle(&self, request: Request) -> Dispatch {
        let Some(route) = Route::classify(self.vocabulary, request.method(), request.uri().path())
        else {
            return Dispatch::Declined(request);
        };

        let response = self
            .serve(route, request)
            .await
            .unwrap_or_else(IntoResponse::into_response);
        Dispatch::Handled(response)
    }
}
