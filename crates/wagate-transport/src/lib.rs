//! # wagate Transport
//!
//! Network transport implementations for the wagate gateway.
//!
//! ## Features
//!
//! - `http-server` (default): shared axum listener serving a chain of
//!   declinable [`RequestHandler`]s
//! - `http-client` (default): [`json_poster`], a `reqwest`-backed
//!   [`PostJsonFn`](wagate_core::PostJsonFn)
//! - `full`: both
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  wagate-compat      │  (gateway, forwarding wrapper)
//! ├─────────────────────┤
//! │  wagate-core        │  (PostJsonFn, ListenerHandle)
//! ├─────────────────────┤
//! │  wagate-transport   │  <- This crate (implementations)
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wagate_transport::server::listen;
//!
//! let listener = listen("0.0.0.0:8080").await?;
//! let _mounted = listener.mount("gateway", Arc::new(gateway));
//! ```

#[cfg(feature = "http-client")]
pub mod http_client;

#[cfg(feature = "http-server")]
pub mod server;

#[cfg(feature = "http-client")]
pub use http_client::json_poster;

#[cfg(feature = "http-server")]
pub use server::{
    BoxedRequestHandler, Dispatch, HandlerChain, HttpListener, RequestHandler, listen,
};
