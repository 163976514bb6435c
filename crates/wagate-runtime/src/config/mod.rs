//! Configuration for the wagate runtime.
//!
//! Layered with figment: defaults, then configuration files, then
//! `WAGATE_*` environment variables, then programmatic overrides.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    ADMIN_TOKEN_ENV, ConfigLoader, ENV_PREFIX, PROFILE_ENV, Profile, load_config,
    load_config_from_file,
};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LoggingConfig, ServerConfig, SpanEventConfig, WagateConfig,
};
pub use validation::validate_config;
pub use wagate_compat::{ForwardingConfig, GatewayConfig, INBOUND_URL_ENV};
