//! # wagate
//!
//! A WhatsApp session compatibility gateway for automation platforms.
//!
//! ## Overview
//!
//! wagate lets RapidPro (or a Wuzapi client) drive a single WhatsApp
//! connection through a small session API: fetch the QR code, poll the
//! connection status, request a phone pairing code. Copies of inbound
//! messages are POSTed to an external inbox before the native handler sees
//! them.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌─────────────────────────── GatewayRuntime ──────────────────────────┐
//! HTTP client ───▶│ HttpListener ──▶ HandlerChain ──▶ CompatGateway ──▶ SessionRegistry │
//!                 │                                                                     │
//! WhatsApp ──────▶│ InboxMonitor ──▶ ForwardingHandler ──▶ native handler               │
//!                 │                        └──▶ InboxForwarder ──▶ POST inbound_url     │
//!                 └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Core**: shared types and collaborator traits
//! - **Transport**: the HTTP listener and the JSON POST client
//! - **Compat**: routing, auth, status translation, pairing, forwarding
//! - **Runtime**: configuration, logging, session registry, lifecycle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wagate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = GatewayRuntime::builder()
//!         .socket_factory(Arc::new(MySocketFactory))
//!         .build()?;
//!
//!     let monitor = runtime.monitor_with_forwarding(MyNativeMonitor::new());
//!     let _inbox = monitor.monitor(InboxOptions::new("default")).await?;
//!
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use wagate_compat as compat;
pub use wagate_core as core;
pub use wagate_runtime as runtime;
pub use wagate_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use wagate::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use wagate_runtime::{
        GatewayRuntime, MemorySessionRegistry, RuntimeBuilder, SocketFactory, WagateConfig,
    };

    // Gateway and forwarding
    pub use wagate_compat::{
        CompatGateway, ForwardingMonitor, InboxForwarder, Vocabulary, with_forwarding,
    };

    // Collaborator seams
    pub use wagate_core::{
        BoxedMessageHandler, BoxedPairingSocket, ConnectionState, InboundMessage, InboxMonitor,
        InboxOptions, ListenerHandle, MessageHandler, PairingSocket, SessionRecord,
        SessionRegistry, handler_fn,
    };

    // Logging macros
    pub use wagate_runtime::prelude::*;
}
