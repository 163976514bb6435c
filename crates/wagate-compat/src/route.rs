//! Route recognition.

use axum::http::Method;

use crate::vocabulary::Vocabulary;

/// Prefix shared by every session route.
pub const SESSION_PREFIX: &str = "/session/";

/// A route the gateway recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/webhook`: webhook registration probe.
    Webhook,
    /// `/session/hmac/config`: HMAC configuration, accepted and ignored.
    HmacConfig,
    /// `/session/qr`: current QR code.
    Qr,
    /// `/session/status`: translated connection status.
    Status,
    /// `POST /session/pairphone`: phone pairing code.
    PairPhone,
    /// Any other path under `/session/`.
    UnknownSession,
}

impl Route {
    /// Classifies a request. `None` means the gateway does not own the path
    /// and the request should be declined.
    pub fn classify(vocabulary: Vocabulary, method: &Method, path: &str) -> Option<Self> {
        if path == "/webhook" {
            return vocabulary.serves_probe_routes().then_some(Self::Webhook);
        }
        if !path.starts_with(SESSION_PREFIX) {
            return None;
        }

        let route = match path {
            "/session/hmac/config" if vocabulary.serves_probe_routes() => Self::HmacConfig,
            "/session/qr" => Self::Qr,
            "/session/status" => Self::Status,
            "/session/pairphone" if method == Method::POST => Self::PairPhone,
            _ => Self::UnknownSession,
        };
        Some(route)
    }

    /// Whether the route operates on the active session.
    pub fn needs_session(&self) -> bool {
        matches!(self, Self::Qr | Self::Status | Self::PairPhone)
    }

    /// Whether a missing session may be created for this route.
    pub fn may_provision(&self) -> bool {
        matches!(self, Self::Qr | Self::Status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rp(method: Method, path: &str) -> Option<Route> {
        Route::classify(Vocabulary::RapidPro, &method, path)
    }

    fn wz(method: Method, path: &str) -> Option<Route> {
        Route::classify(Vocabulary::Wuzapi, &method, path)
    }

    #[test]
    fn test_rapidpro_routes() {
        assert_eq!(rp(Method::POST, "/webhook"), Some(Route::Webhook));
        assert_eq!(rp(Method::POST, "/session/hmac/config"), Some(Route::HmacConfig));
        assert_eq!(rp(Method::GET, "/session/qr"), Some(Route::Qr));
        assert_eq!(rp(Method::GET, "/session/status"), Some(Route::Status));
        assert_eq!(rp(Method::POST, "/session/pairphone"), Some(Route::PairPhone));
        assert_eq!(rp(Method::GET, "/session/pairphone"), Some(Route::UnknownSession));
        assert_eq!(rp(Method::GET, "/session/nope"), Some(Route::UnknownSession));
    }

    #[test]
    fn test_wuzapi_has_no_probe_routes() {
        assert_eq!(wz(Method::POST, "/webhook"), None);
        assert_eq!(wz(Method::POST, "/session/hmac/config"), Some(Route::UnknownSession));
        assert_eq!(wz(Method::GET, "/session/qr"), Some(Route::Qr));
    }

    #[test]
    fn test_outside_prefix_is_declined() {
        assert_eq!(rp(Method::GET, "/session"), None);
        assert_eq!(rp(Method::GET, "/health"), None);
        assert_eq!(rp(Method::GET, "/webhook/extra"), None);
        assert_eq!(wz(Method::GET, "/"), None);
    }

    #[test]
    fn test_session_requirements() {
        assert!(!Route::Webhook.needs_session());
        assert!(!Route::HmacConfig.needs_session());
        assert!(!Route::UnknownSession.needs_session());
        assert!(Route::PairPhone.needs_session());
        assert!(!Route::PairPhone.may_provision());
        assert!(Route::Qr.may_provision());
        assert!(Route::Status.may_provision());
    }
}
