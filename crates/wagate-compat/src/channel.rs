//! Channel decoration: the native inbox monitor with forwarding injected.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use wagate_core::{InboxMonitor, InboxOptions, ListenerHandle, TransportResult};

use crate::forward::{InboxForwarder, with_forwarding};

/// Identity under which the decorated channel registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelDescriptor {
    /// Channel id.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
}

/// Descriptor of the RapidPro WhatsApp channel.
pub const RAPIDPRO_CHANNEL: ChannelDescriptor = ChannelDescriptor {
    id: "rapidpro-whatsapp",
    name: "RapidPro WhatsApp",
    description: "Native WhatsApp integration with RapidPro forwarding",
};

/// An [`InboxMonitor`] that starts the native monitor with every inbound
/// message forwarded first.
///
/// Only `on_message` is replaced; all other options pass through.
pub struct ForwardingMonitor<M> {
    native: M,
    forwarder: Arc<InboxForwarder>,
    descriptor: ChannelDescriptor,
}

impl<M: InboxMonitor> ForwardingMonitor<M> {
    /// Decorates `native` under [`RAPIDPRO_CHANNEL`].
    pub fn new(native: M, forwarder: Arc<InboxForwarder>) -> Self {
        Self {
            native,
            forwarder,
            descriptor: RAPIDPRO_CHANNEL,
        }
    }

    /// Overrides the channel descriptor.
    pub fn with_descriptor(mut self, descriptor: ChannelDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Returns the channel descriptor.
    pub fn descriptor(&self) -> &ChannelDescriptor {
        &self.descriptor
    }

    /// Returns the wrapped monitor.
    pub fn native(&self) -> &M {
        &self.native
    }
}

#[async_trait]
impl<M: InboxMonitor> InboxMonitor for ForwardingMonitor<M> {
    async fn monitor(&self, options: InboxOptions) -> TransportResult<ListenerHandle> {
        info!(
            channel = self.descriptor.id,
            account = %options.account_id,
            forwarding = self.forwarder.url().is_some(),
            "Starting inbox monitor"
        );
        let forwarder = self.forwarder.clone();
        let options = options.map_on_message(|inner| Some(with_forwarding(inner, forwarder)));
        self.native.monitor(options).await
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use futures::FutureExt;
    use parking_lot::Mutex;
    use serde_json::Value;
    use wagate_core::{InboundMessage, PostJsonFn, PostReply, TransportError, handler_fn};

    use super::*;

    /// Native monitor that delivers one message through the options it got.
    #[derive(Default)]
    struct FakeNative {
        seen: Mutex<Option<InboxOptions>>,
    }

    #[async_trait]
    impl InboxMonitor for FakeNative {
        async fn monitor(&self, options: InboxOptions) -> TransportResult<ListenerHandle> {
            if let Some(handler) = &options.on_message {
                handler.on_message(InboundMessage::new("+1", "ping")).await;
            }
            *self.seen.lock() = Some(options);
            Ok(ListenerHandle::new("fake-native", Default::default()))
        }
    }

    fn recording_post(posted: Arc<Mutex<Vec<Value>>>) -> PostJsonFn {
        Arc::new(move |_url: String, body: Value| {
            let posted = posted.clone();
            async move {
                posted.lock().push(body);
                Ok::<_, TransportError>(PostReply {
                    status: 200,
                    body: String::new(),
                })
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_monitor_injects_forwarding_and_keeps_options() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let handled = Arc::new(Mutex::new(Vec::new()));
        let forwarder = Arc::new(InboxForwarder::new(
            Some("http://inbox.local".into()),
            recording_post(posted.clone()),
        ));
        let monitor = ForwardingMonitor::new(FakeNative::default(), forwarder);

        let handled_clone = handled.clone();
        let mut options = InboxOptions::new("acct-1").with_on_message(handler_fn(
            move |message: InboundMessage| {
                let handled = handled_clone.clone();
                async move {
                    handled.lock().push(message.body);
                }
            },
        ));
        options.verbose = true;
        options.auth_dir = Some(PathBuf::from("/var/lib/wagate/auth"));
        options.media_max_bytes = Some(5 * 1024 * 1024);

        let _handle = monitor.monitor(options).await.unwrap();

        assert_eq!(posted.lock().len(), 1);
        assert_eq!(posted.lock()[0]["text"], "ping");
        assert_eq!(*handled.lock(), vec!["ping".to_string()]);

        let seen = monitor.native().seen.lock();
        let seen = seen.as_ref().unwrap();
        assert_eq!(seen.account_id, "acct-1");
        assert!(seen.verbose);
        assert_eq!(seen.auth_dir, Some(PathBuf::from("/var/lib/wagate/auth")));
        assert_eq!(seen.media_max_bytes, Some(5 * 1024 * 1024));
    }

    #[tokio::test]
    async fn test_monitor_without_native_handler_still_forwards() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let forwarder = Arc::new(InboxForwarder::new(
            Some("http://inbox.local".into()),
            recording_post(posted.clone()),
        ));
        let monitor = ForwardingMonitor::new(FakeNative::default(), forwarder);
        let _handle = monitor.monitor(InboxOptions::new("acct")).await.unwrap();
        assert_eq!(posted.lock().len(), 1);
    }

    #[test]
    fn test_descriptor() {
        assert_eq!(RAPIDPRO_CHANNEL.id, "rapidpro-whatsapp");
        assert_eq!(RAPIDPRO_CHANNEL.name, "RapidPro WhatsApp");
    }
}
