//! Inbound message forwarding.
//!
//! [`with_forwarding`] decorates a native message handler: each message is
//! first POSTed to the external inbox (when a URL is configured), then handed
//! to the original handler unchanged. Forwarding is at-most-once and its
//! outcome never reaches the handler.
//!
//! ```text
//! message ─▶ ForwardingHandler ─▶ POST inbound_url   (logged on failure)
//!                 │
//!                 └─────────────▶ original.on_message(message)
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, warn};

use wagate_core::{
    BoxedMessageHandler, ChatType, ForwardError, ForwardResult, InboundMessage, MessageHandler,
    PostJsonFn, TransportResult,
};
use wagate_transport::json_poster;

use crate::config::ForwardingConfig;

// =============================================================================
// Payload
// =============================================================================

/// JSON body sent to the external inbox.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardPayload {
    /// Sender address.
    pub from: String,
    /// Message text.
    pub text: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Sender details.
    pub metadata: ForwardMetadata,
}

/// Optional sender details carried with a [`ForwardPayload`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardMetadata {
    /// Sender display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
    /// Direct or group chat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_type: Option<ChatType>,
}

impl ForwardPayload {
    /// Builds a payload, stamping the current time when the message has no
    /// timestamp or a zero one.
    pub fn from_message(message: &InboundMessage) -> Self {
        let timestamp = message
            .timestamp
            .filter(|ts| *ts != 0)
            .unwrap_or_else(now_millis);
        Self {
            from: message.from.clone(),
            text: message.body.clone(),
            timestamp,
            metadata: ForwardMetadata {
                push_name: message.push_name.clone(),
                chat_type: message.chat_type,
            },
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

// =============================================================================
// Forwarder
// =============================================================================

/// Sends inbound messages to the external inbox.
pub struct InboxForwarder {
    url: Option<String>,
    post: PostJsonFn,
    timeout: Duration,
    warn_sample_rate: f64,
}

impl InboxForwarder {
    /// Creates a forwarder. `None` or an empty URL disables sending.
    pub fn new(url: Option<String>, post: PostJsonFn) -> Self {
        let defaults = ForwardingConfig::default();
        Self {
            url: url.filter(|u| !u.is_empty()),
            post,
            timeout: defaults.timeout(),
            warn_sample_rate: defaults.warn_sample_rate,
        }
    }

    /// Creates a forwarder backed by an HTTP client.
    pub fn from_config(config: &ForwardingConfig) -> TransportResult<Self> {
        let post = json_poster(config.timeout())?;
        Ok(Self::new(config.inbound_url.clone(), post)
            .with_timeout(config.timeout())
            .with_warn_sample_rate(config.warn_sample_rate))
    }

    /// Sets the per-message deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the probability of warning about a missing URL.
    pub fn with_warn_sample_rate(mut self, rate: f64) -> Self {
        self.warn_sample_rate = rate;
        self
    }

    /// Returns the destination, if forwarding is enabled.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Forwards one message. Never fails; every problem is logged.
    pub async fn forward(&self, message: &InboundMessage) {
        let Some(url) = self.url.as_deref() else {
            if sampled(self.warn_sample_rate) {
                warn!("RAPIDPRO_INBOUND_URL not set, inbound messages are not forwarded");
            }
            return;
        };

        match self.send(url, message).await {
            Ok(()) => {}
            Err(e @ ForwardError::Status { .. }) => {
                warn!(url = %url, from = %message.from, error = %e, "Inbox rejected forwarded message");
            }
            Err(e) => {
                error!(url = %url, from = %message.from, error = %e, "Failed to forward message");
            }
        }
    }

    async fn send(&self, url: &str, message: &InboundMessage) -> ForwardResult<()> {
        let body = serde_json::to_value(ForwardPayload::from_message(message))?;
        debug!(url = %url, from = %message.from, "Forwarding inbound message");

        let reply = tokio::time::timeout(self.timeout, (self.post)(url.to_string(), body))
            .await
            .map_err(|_| ForwardError::Timeout(self.timeout))??;

        if reply.is_success() {
            Ok(())
        } else {
            Err(ForwardError::Status {
                status: reply.status,
                body: truncate(reply.body, 256),
            })
        }
    }
}

fn sampled(rate: f64) -> bool {
    rate > 0.0 && rand::random::<f64>() < rate
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
    s
}

// =============================================================================
// Handler decoration
// =============================================================================

/// Message handler that forwards before delegating.
pub struct ForwardingHandler {
    inner: Option<BoxedMessageHandler>,
    forwarder: Arc<InboxForwarder>,
}

impl ForwardingHandler {
    /// Wraps `inner`.
    pub fn new(inner: Option<BoxedMessageHandler>, forwarder: Arc<InboxForwarder>) -> Self {
        Self { inner, forwarder }
    }
}

#[async_trait]
impl MessageHandler for ForwardingHandler {
    async fn on_message(&self, message: InboundMessage) {
        self.forwarder.forward(&message).await;
        if let Some(inner) = &self.inner {
            inner.on_message(message).await;
        }
    }
}

/// Decorates `inner` so every message is forwarded first.
///
/// The returned handler always calls `inner` (when present) exactly once per
/// message, whatever happened to the forwarding attempt.
pub fn with_forwarding(
    inner: Option<BoxedMessageHandler>,
    forwarder: Arc<InboxForwarder>,
) -> BoxedMessageHandler {
    Arc::new(ForwardingHandler::new(inner, forwarder))
}
