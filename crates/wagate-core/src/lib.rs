//! # wagate Core
//!
//! Types and collaborator interfaces shared by every wagate crate.
//!
//! wagate lets automation platforms (RapidPro, Wuzapi clients) drive one
//! WhatsApp connection over a small HTTP API, while copies of inbound
//! messages are forwarded to an external inbox. This crate owns nothing that
//! talks to the network; it defines the seams:
//!
//! - **Sessions**: [`SessionRecord`], [`ConnectionState`] and the
//!   [`SessionRegistry`] owned by the WhatsApp connection layer
//! - **Pairing**: the [`PairingSocket`] capability
//! - **Inbound pipeline**: [`InboundMessage`], [`MessageHandler`],
//!   [`InboxOptions`] and the native [`InboxMonitor`]
//! - **Transport shapes**: [`PostJsonFn`] and [`ListenerHandle`]
//! - **Errors**: one enum per collaborator boundary
//!
//! ```text
//! ┌──────────────┐   list / create   ┌──────────────────┐
//! │   Gateway    │──────────────────▶│ SessionRegistry  │ (connection layer)
//! │ (compat API) │   pairing code    │  └ PairingSocket │
//! └──────────────┘──────────────────▶└──────────────────┘
//!
//! ┌──────────────┐  on_message   ┌────────────┐  on_message  ┌─────────────┐
//! │ InboxMonitor │──────────────▶│ Forwarding │─────────────▶│   Native    │
//! │   (native)   │               │  wrapper   │              │   handler   │
//! └──────────────┘               └────────────┘              └─────────────┘
//! ```

pub mod error;
pub mod inbound;
pub mod session;
pub mod transport;

pub use error::{
    ForwardError, ForwardResult, PairingError, PairingResult, RegistryError, RegistryResult,
    TransportError, TransportResult,
};
pub use inbound::{
    BoxedMessageHandler, ChatType, HandlerFn, InboundMessage, InboxMonitor, InboxOptions,
    MessageHandler, handler_fn,
};
pub use session::{
    BoxedPairingSocket, BoxedSessionRegistry, ConnectionState, PairingSocket, SessionRecord,
    SessionRegistry, first_session,
};
pub use transport::{ListenerHandle, PostJsonFn, PostReply};

/// Prelude for common imports.
pub mod prelude {
    pub use super::inbound::{InboundMessage, MessageHandler, handler_fn};
    pub use super::session::{ConnectionState, PairingSocket, SessionRecord, SessionRegistry};
}
