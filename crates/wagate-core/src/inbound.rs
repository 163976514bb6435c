//! Inbound message pipeline interfaces.
//!
//! The native pipeline is started through an [`InboxMonitor`], which accepts
//! an [`InboxOptions`] bag. One field of that bag is the
//! [`MessageHandler`] invoked for every received message; decorators replace
//! that field and leave everything else alone.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportResult;
use crate::transport::ListenerHandle;

/// Kind of chat a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    /// One-to-one chat.
    Direct,
    /// Group chat.
    Group,
}

/// A message received by the WhatsApp socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Message id assigned by WhatsApp.
    #[serde(default)]
    pub id: Option<String>,
    /// Sender JID or E.164 number.
    pub from: String,
    /// Text body.
    #[serde(default)]
    pub body: String,
    /// Epoch milliseconds, when the socket supplied one.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Sender display name.
    #[serde(default)]
    pub push_name: Option<String>,
    /// Chat kind.
    #[serde(default)]
    pub chat_type: Option<ChatType>,
}

impl InboundMessage {
    /// Creates a message with only a sender and a body.
    pub fn new(from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: None,
            from: from.into(),
            body: body.into(),
            timestamp: None,
            push_name: None,
            chat_type: None,
        }
    }

    /// Sets the timestamp.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the sender display name.
    pub fn with_push_name(mut self, name: impl Into<String>) -> Self {
        self.push_name = Some(name.into());
        self
    }

    /// Sets the chat kind.
    pub fn with_chat_type(mut self, chat_type: ChatType) -> Self {
        self.chat_type = Some(chat_type);
        self
    }
}

// =============================================================================
// Message Handler
// =============================================================================

/// Callback for received messages.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handles one message. Returns once processing is complete.
    async fn on_message(&self, message: InboundMessage);
}

/// Shared message handler.
pub type BoxedMessageHandler = Arc<dyn MessageHandler>;

/// A [`MessageHandler`] backed by an async closure.
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> MessageHandler for HandlerFn<F>
where
    F: Fn(InboundMessage) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_message(&self, message: InboundMessage) {
        (self.f)(message).await;
    }
}

/// Wraps an async closure into a [`BoxedMessageHandler`].
///
/// ```rust,ignore
/// let handler = handler_fn(|msg| async move {
///     println!("{}: {}", msg.from, msg.body);
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> BoxedMessageHandler
where
    F: Fn(InboundMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(HandlerFn { f })
}

// =============================================================================
// Inbox Options
// =============================================================================

/// Options the native inbox monitor is started with.
#[derive(Clone, Default)]
pub struct InboxOptions {
    /// Account the monitor runs for.
    pub account_id: String,
    /// Verbose logging in the native pipeline.
    pub verbose: bool,
    /// Directory holding the socket credentials.
    pub auth_dir: Option<PathBuf>,
    /// Largest media payload the pipeline downloads.
    pub media_max_bytes: Option<u64>,
    /// Whether read receipts are sent back.
    pub send_read_receipts: bool,
    /// Callback for every received message.
    pub on_message: Option<BoxedMessageHandler>,
}

impl InboxOptions {
    /// Creates options for an account with everything else defaulted.
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Default::default()
        }
    }

    /// Sets the message handler.
    pub fn with_on_message(mut self, handler: BoxedMessageHandler) -> Self {
        self.on_message = Some(handler);
        self
    }

    /// Replaces the message handler, leaving every other field untouched.
    pub fn map_on_message<F>(self, f: F) -> Self
    where
        F: FnOnce(Option<BoxedMessageHandler>) -> Option<BoxedMessageHandler>,
    {
        let Self {
            account_id,
            verbose,
            auth_dir,
            media_max_bytes,
            send_read_receipts,
            on_message,
        } = self;
        Self {
            account_id,
            verbose,
            auth_dir,
            media_max_bytes,
            send_read_receipts,
            on_message: f(on_message),
        }
    }
}

impl fmt::Debug for InboxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboxOptions")
            .field("account_id", &self.account_id)
            .field("verbose", &self.verbose)
            .field("auth_dir", &self.auth_dir)
            .field("media_max_bytes", &self.media_max_bytes)
            .field("send_read_receipts", &self.send_read_receipts)
            .field("on_message", &self.on_message.is_some())
            .finish()
    }
}

// =============================================================================
// Inbox Monitor
// =============================================================================

/// The native inbound pipeline.
#[async_trait]
pub trait InboxMonitor: Send + Sync {
    /// Starts monitoring with the given options.
    async fn monitor(&self, options: InboxOptions) -> TransportResult<ListenerHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_handler_fn_invokes_closure() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let handler = handler_fn(move |_msg| {
            let c = Arc::clone(&counter_clone);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        handler.on_message(InboundMessage::new("123", "hi")).await;
        handler.on_message(InboundMessage::new("123", "again")).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_map_on_message_keeps_other_fields() {
        let options = InboxOptions {
            account_id: "acct".into(),
            verbose: true,
            auth_dir: Some(PathBuf::from("/var/lib/wa")),
            media_max_bytes: Some(5 * 1024 * 1024),
            send_read_receipts: true,
            on_message: None,
        };

        let mapped = options.map_on_message(|_| Some(handler_fn(|_| async {})));
        assert_eq!(mapped.account_id, "acct");
        assert!(mapped.verbose);
        assert_eq!(mapped.auth_dir, Some(PathBuf::from("/var/lib/wa")));
        assert_eq!(mapped.media_max_bytes, Some(5 * 1024 * 1024));
        assert!(mapped.send_read_receipts);
        assert!(mapped.on_message.is_some());
    }

    #[test]
    fn test_inbound_message_deserialize() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"from":"+15551234567","body":"hi","pushName":"Ann","chatType":"group"}"#,
        )
        .unwrap();
        assert_eq!(msg.push_name.as_deref(), Some("Ann"));
        assert_eq!(msg.chat_type, Some(ChatType::Group));
        assert_eq!(msg.timestamp, None);
    }
}
