//! # wagate Compat
//!
//! RapidPro / Wuzapi session compatibility gateway and inbound forwarding.
//!
//! ## Gateway
//!
//! [`CompatGateway`] lets automation platforms drive one WhatsApp session
//! through a small HTTP API. It is a [`RequestHandler`](wagate_transport::RequestHandler):
//! paths it does not own are declined so other handlers can share the
//! listener.
//!
//! | Route | Success body |
//! |---|---|
//! | `/webhook` | `{"status":"success"}` |
//! | `/session/hmac/config` | `{"status":"success"}` |
//! | `/session/qr` | `{"data":{"QRCode":"..."}}` |
//! | `/session/status` | `{"status":"CONNECTED","id":"default"}` |
//! | `POST /session/pairphone` | `{"LinkingCode":"..."}` |
//!
//! Failures are `{"error":"..."}` with 400, 403, 404, 500 or 503.
//!
//! ## Forwarding
//!
//! [`with_forwarding`] decorates a native message handler so each inbound
//! message is POSTed to an external inbox before the handler runs.
//! [`ForwardingMonitor`] applies that decoration to a whole inbox monitor.
//!
//! ```rust,ignore
//! use wagate_compat::{CompatGateway, InboxForwarder, Vocabulary, with_forwarding};
//!
//! let gateway = CompatGateway::new(Vocabulary::RapidPro, registry).with_admin_token("s3cret");
//! let _mounted = listener.mount("gateway", Arc::new(gateway));
//!
//! let forwarder = Arc::new(InboxForwarder::from_config(&config.forwarding)?);
//! let handler = with_forwarding(Some(native_handler), forwarder);
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod forward;
pub mod gateway;
pub mod pairing;
pub mod provision;
pub mod route;
pub mod status;
pub mod vocabulary;

pub use channel::{ChannelDescriptor, ForwardingMonitor, RAPIDPRO_CHANNEL};
pub use config::{ForwardingConfig, GatewayConfig, INBOUND_URL_ENV};
pub use error::{GatewayError, GatewayResult, NO_SESSION_MESSAGE};
pub use forward::{
    ForwardMetadata, ForwardPayload, ForwardingHandler, InboxForwarder, with_forwarding,
};
pub use gateway::CompatGateway;
pub use pairing::{PairingRequest, normalize_phone};
pub use provision::resolve_session;
pub use route::Route;
pub use status::ExternalStatus;
pub use vocabulary::Vocabulary;
