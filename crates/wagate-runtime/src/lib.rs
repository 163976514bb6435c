//! wagate Runtime - Orchestration layer for the wagate gateway.
//!
//! This crate provides:
//! - Layered configuration (`ConfigLoader`, `WagateConfig`)
//! - Logging setup (`LoggingBuilder`)
//! - An in-memory session registry (`MemorySessionRegistry`)
//! - Runtime orchestration (`GatewayRuntime`)
//!
//! ```ignore
//! use wagate_runtime::GatewayRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = GatewayRuntime::builder()
//!         .socket_factory(Arc::new(MySocketFactory))
//!         .build()?;
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `WAGATE_PROFILE` | Selects `wagate.<profile>.toml` |
//! | `WAGATE_<SECTION>__<KEY>` | Overrides any key, e.g. `WAGATE_SERVER__PORT` |
//! | `WAGATE_ADMIN_TOKEN` | `gateway.admin_token` |
//! | `RAPIDPRO_INBOUND_URL` | `forwarding.inbound_url` |

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, WagateConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use registry::{
    BoxedSocketFactory, DEFAULT_SESSION_ID, MemorySessionRegistry, RegistryStats, SocketFactory,
};
pub use runtime::{GatewayRuntime, RuntimeBuilder, wait_for_shutdown};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
