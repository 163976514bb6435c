//! Runtime orchestration.
//!
//! The runtime owns the configuration, the session registry and the
//! forwarder. Starting it binds the HTTP listener and mounts the
//! compatibility gateway; the host wires its native inbox through
//! [`GatewayRuntime::forwarding_handler`] or
//! [`GatewayRuntime::monitor_with_forwarding`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use wagate_runtime::GatewayRuntime;
//!
//! let runtime = GatewayRuntime::builder()
//!     .config_file("config/wagate.toml")
//!     .socket_factory(Arc::new(MySocketFactory))
//!     .build()?;
//!
//! let monitor = runtime.monitor_with_forwarding(native_monitor);
//! let _inbox = monitor.monitor(InboxOptions::new("default")).await?;
//!
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::signal;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use wagate_compat::{CompatGateway, ForwardingMonitor, InboxForwarder, with_forwarding};
use wagate_core::{
    BoxedMessageHandler, BoxedSessionRegistry, InboxMonitor, ListenerHandle,
};
use wagate_transport::{BoxedRequestHandler, HttpListener, listen};

use crate::config::{ConfigLoader, WagateConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::registry::{BoxedSocketFactory, MemorySessionRegistry};

/// Name the gateway is mounted under.
pub const GATEWAY_HANDLER: &str = "compat-gateway";

struct Running {
    listener: HttpListener,
    _gateway: ListenerHandle,
}

/// The wagate runtime.
pub struct GatewayRuntime {
    config: WagateConfig,
    bind_addr: String,
    registry: BoxedSessionRegistry,
    forwarder: Arc<InboxForwarder>,
    running: Mutex<Option<Running>>,
}

impl GatewayRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration.
    ///
    /// Initializes logging, validates the configuration and prepares the
    /// forwarding client.
    pub fn from_config(
        config: WagateConfig,
        registry: BoxedSessionRegistry,
    ) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);
        validate_config(&config)?;

        let forwarder = Arc::new(InboxForwarder::from_config(&config.forwarding)?);

        info!(
            vocabulary = %config.gateway.vocabulary,
            bind = %config.server.bind_addr(),
            forwarding_url = config.forwarding.url().unwrap_or("<unset>"),
            admin_token = !config.gateway.admin_token.is_empty(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            bind_addr: config.server.bind_addr(),
            config,
            registry,
            forwarder,
            running: Mutex::new(None),
        })
    }

    /// Overrides the address the listener binds.
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WagateConfig {
        &self.config
    }

    /// Returns the session registry.
    pub fn registry(&self) -> &BoxedSessionRegistry {
        &self.registry
    }

    /// Returns the shared forwarder.
    pub fn forwarder(&self) -> Arc<InboxForwarder> {
        self.forwarder.clone()
    }

    /// Builds a gateway over this runtime's registry.
    pub fn gateway(&self) -> CompatGateway {
        CompatGateway::from_config(&self.config.gateway, self.registry.clone())
    }

    /// Decorates a native message handler with inbound forwarding.
    pub fn forwarding_handler(&self, inner: Option<BoxedMessageHandler>) -> BoxedMessageHandler {
        with_forwarding(inner, self.forwarder())
    }

    /// Decorates a native inbox monitor with inbound forwarding.
    pub fn monitor_with_forwarding<M: InboxMonitor>(&self, native: M) -> ForwardingMonitor<M> {
        ForwardingMonitor::new(native, self.forwarder())
    }

    /// Returns whether the listener is up.
    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Returns the bound address while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.listener.local_addr())
    }

    /// Binds the listener and mounts the gateway.
    pub async fn start(&self) -> RuntimeResult<SocketAddr> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(RuntimeError::AlreadyRunning);
        }

        let listener = listen(&self.bind_addr).await?;
        let gateway = listener.mount(GATEWAY_HANDLER, Arc::new(self.gateway()));
        let addr = listener.local_addr();

        info!(
            addr = %addr,
            vocabulary = %self.config.gateway.vocabulary,
            "wagate runtime started"
        );

        *running = Some(Running {
            listener,
            _gateway: gateway,
        });
        Ok(addr)
    }

    /// Mounts an extra handler after the gateway.
    pub async fn mount(
        &self,
        name: impl Into<String>,
        handler: BoxedRequestHandler,
    ) -> RuntimeResult<ListenerHandle> {
        let running = self.running.lock().await;
        let running = running.as_ref().ok_or(RuntimeError::NotRunning)?;
        Ok(running.listener.mount(name, handler))
    }

    /// Stops the listener.
    pub async fn stop(&self) -> RuntimeResult<()> {
        let Some(running) = self.running.lock().await.take() else {
            warn!("Runtime is not running");
            return Ok(());
        };
        running.listener.shutdown();
        info!("wagate runtime stopped");
        Ok(())
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;
        info!("wagate runtime is now running. Press Ctrl+C to stop.");
        wait_for_shutdown().await;
        self.stop().await
    }

    /// Runs until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM.
pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
                return;
            }
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler, waiting for Ctrl+C only");
            }
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`GatewayRuntime`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    registry: Option<BoxedSessionRegistry>,
    bind_addr: Option<String>,
}

impl RuntimeBuilder {
    /// Creates a builder searching the current directory for configuration.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            registry: None,
            bind_addr: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration values on top of every other source.
    pub fn merge<T: Serialize>(mut self, overrides: T) -> Self {
        self.config_loader = self.config_loader.merge(overrides);
        self
    }

    /// Uses an existing session registry.
    pub fn registry(mut self, registry: BoxedSessionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Uses an in-memory registry whose sessions come from `factory`.
    pub fn socket_factory(mut self, factory: BoxedSocketFactory) -> Self {
        self.registry = Some(Arc::new(MemorySessionRegistry::new(factory)));
        self
    }

    /// Overrides the listener address, bypassing `server.host` / `server.port`.
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = Some(addr.into());
        self
    }

    /// Loads configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<GatewayRuntime> {
        let config = self.config_loader.load()?;
        let registry = match self.registry {
            Some(registry) => registry,
            None => {
                warn!("No session registry or socket factory given, sessions cannot be created");
                Arc::new(MemorySessionRegistry::without_factory())
            }
        };

        let runtime = GatewayRuntime::from_config(config, registry)?;
        Ok(match self.bind_addr {
            Some(addr) => runtime.with_bind_addr(addr),
            None => runtime,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        Json,
        extract::Request,
        response::IntoResponse,
    };
    use serde_json::json;
    use tokio::sync::oneshot;
    use wagate_core::{
        BoxedPairingSocket, InboundMessage, PairingResult, PairingSocket, RegistryResult,
        handler_fn,
    };
    use wagate_transport::{Dispatch, RequestHandler, json_poster};

    use super::*;
    use crate::registry::SocketFactory;

    struct FixedSocket;

    #[async_trait]
    impl PairingSocket for FixedSocket {
        async fn request_pairing_code(&self, _phone: &str) -> PairingResult<String> {
            Ok("1234-5678".into())
        }
    }

    struct FixedFactory;

    #[async_trait]
    impl SocketFactory for FixedFactory {
        async fn create_socket(&self, _session_id: &str) -> RegistryResult<BoxedPairingSocket> {
            Ok(Arc::new(FixedSocket))
        }
    }

    struct Health;

    #[async_trait]
    impl RequestHandler for Health {
        async fn handle(&self, request: Request) -> Dispatch {
            if request.uri().path() == "/healthz" {
                Dispatch::Handled(Json(json!({ "ok": true })).into_response())
            } else {
                Dispatch::Declined(request)
            }
        }
    }

    fn runtime() -> GatewayRuntime {
        GatewayRuntime::builder()
            .without_env()
            .search_path("/nonexistent-wagate-config-dir")
            .socket_factory(Arc::new(FixedFactory))
            .bind_addr("127.0.0.1:0")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_serves_gateway() {
        let runtime = runtime();
        let addr = runtime.start().await.unwrap();
        let post = json_poster(Duration::from_secs(5)).unwrap();

        let reply = post(format!("http://{addr}/webhook"), json!({})).await.unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&reply.body).unwrap(),
            json!({ "status": "success" })
        );

        let reply = post(format!("http://{addr}/session/status"), json!({})).await.unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(runtime.registry().list_sessions().await.len(), 1);

        let reply = post(
            format!("http://{addr}/session/pairphone"),
            json!({ "phone": "+49 170 000" }),
        )
        .await
        .unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&reply.body).unwrap(),
            json!({ "LinkingCode": "1234-5678" })
        );

        runtime.stop().await.unwrap();
        assert!(!runtime.is_running().await);
    }

    #[tokio::test]
    async fn test_extra_handler_shares_listener() {
        let runtime = runtime();
        assert!(matches!(
            runtime.mount("health", Arc::new(Health)).await,
            Err(RuntimeError::NotRunning)
        ));

        let addr = runtime.start().await.unwrap();
        let _health = runtime.mount("health", Arc::new(Health)).await.unwrap();
        let post = json_poster(Duration::from_secs(5)).unwrap();

        let reply = post(format!("http://{addr}/healthz"), json!({})).await.unwrap();
        assert_eq!(reply.status, 200);

        let reply = post(format!("http://{addr}/elsewhere"), json!({})).await.unwrap();
        assert_eq!(reply.status, 404);

        runtime.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let runtime = runtime();
        runtime.start().await.unwrap();
        assert!(matches!(
            runtime.start().await,
            Err(RuntimeError::AlreadyRunning)
        ));
        runtime.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_until_stops() {
        let runtime = runtime();
        let (tx, rx) = oneshot::channel::<()>();
        tx.send(()).unwrap();
        runtime
            .run_until(async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        assert!(!runtime.is_running().await);
    }

    #[tokio::test]
    async fn test_forwarding_handler_always_delegates() {
        let runtime = runtime();
        let (tx, rx) = oneshot::channel::<String>();
        let tx = Arc::new(std::sync::Mutex::new(Some(tx)));
        let native = handler_fn(move |message: InboundMessage| {
            let tx = tx.clone();
            async move {
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(message.body);
                }
            }
        });

        let handler = runtime.forwarding_handler(Some(native));
        handler.on_message(InboundMessage::new("+1", "hello")).await;
        assert_eq!(rx.await.unwrap(), "hello");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = GatewayRuntime::builder()
            .without_env()
            .search_path("/nonexistent-wagate-config-dir")
            .merge(json!({ "forwarding": { "inbound_url": "ftp://inbox" } }))
            .build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }
}
