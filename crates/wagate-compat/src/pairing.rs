//! Phone-number pairing.

use serde::Deserialize;
use tracing::{debug, warn};
use wagate_core::SessionRecord;

use crate::error::{GatewayError, GatewayResult};

/// Body of a pairing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PairingRequest {
    /// Phone number as sent by the client.
    #[serde(default)]
    pub phone: Option<String>,
}

impl PairingRequest {
    /// Parses a raw request body. Anything that is not a JSON object with a
    /// string `phone` yields an empty request.
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|e| {
            debug!(error = %e, "Unparseable pairing body");
            Self::default()
        })
    }

    /// Returns the phone number with every non-digit removed.
    pub fn normalized_phone(&self) -> String {
        self.phone.as_deref().map(normalize_phone).unwrap_or_default()
    }
}

/// Strips every character that is not an ASCII digit.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Requests a pairing code for `body` from the session's socket.
pub async fn request_code(session: &SessionRecord, body: &[u8]) -> GatewayResult<String> {
    let phone = PairingRequest::parse(body).normalized_phone();
    if phone.is_empty() {
        return Err(GatewayError::BadRequest("Missing phone number".into()));
    }

    session
        .socket
        .request_pairing_code(&phone)
        .await
        .map_err(|e| {
            warn!(session = %session.id, error = %e, "Pairing code request failed");
            GatewayError::Upstream(e.to_string())
        })
}
