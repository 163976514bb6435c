//! Shared HTTP listener with a chain of declinable request handlers.
//!
//! Every request is offered to the mounted handlers in mount order. A
//! handler either answers it ([`Dispatch::Handled`]) or hands it back
//! untouched ([`Dispatch::Declined`]) so the next handler can try. When all
//! handlers decline, the listener answers **404**.
//!
//! ```text
//! 0.0.0.0:8080
//! ├── gateway   (/webhook, /session/*)
//! ├── health    (/healthz)
//! └── fallback  → 404 {"error":"Not Found"}
//! ```
//!
//! Handlers can be mounted while the listener is serving; each mount returns
//! a [`ListenerHandle`] whose cancellation unmounts the handler again.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, trace};

use wagate_core::{ListenerHandle, TransportError, TransportResult};

// ─── Handler contract ─────────────────────────────────────────────────────────

/// Outcome of offering a request to a [`RequestHandler`].
pub enum Dispatch {
    /// The handler wrote a response.
    Handled(Response),
    /// The handler does not own this request; it is returned unconsumed.
    Declined(Request),
}

/// A handler that may decline requests it does not recognize.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handles or declines a request.
    async fn handle(&self, request: Request) -> Dispatch;
}

/// Shared request handler.
pub type BoxedRequestHandler = Arc<dyn RequestHandler>;

// ─── Handler chain ────────────────────────────────────────────────────────────

struct MountedHandler {
    name: String,
    handler: BoxedRequestHandler,
}

/// Ordered, shareable list of request handlers.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Arc<RwLock<Vec<MountedHandler>>>,
}

impl HandlerChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler under `name`.
    pub fn push(&self, name: impl Into<String>, handler: BoxedRequestHandler) {
        let name = name.into();
        debug!(handler = %name, "Mounted request handler");
        self.handlers.write().push(MountedHandler { name, handler });
    }

    /// Removes every handler mounted under `name`. Returns whether any was removed.
    pub fn remove(&self, name: &str) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|h| h.name != name);
        handlers.len() != before
    }

    /// Returns the number of mounted handlers.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Returns `true` if no handler is mounted.
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Offers `request` to each handler in order.
    pub async fn dispatch(&self, mut request: Request) -> Response {
        // Snapshot so the lock is never held across an await.
        let handlers: Vec<(String, BoxedRequestHandler)> = self
            .handlers
            .read()
            .iter()
            .map(|h| (h.name.clone(), Arc::clone(&h.handler)))
            .collect();

        for (name, handler) in handlers {
            match handler.handle(request).await {
                Dispatch::Handled(response) => {
                    trace!(handler = %name, status = %response.status(), "Request handled");
                    return response;
                }
                Dispatch::Declined(returned) => request = returned,
            }
        }

        debug!(path = %request.uri().path(), "No handler accepted request");
        (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" }))).into_response()
    }

    /// Builds an axum [`Router`] that sends every request through this chain.
    pub fn into_router(self) -> Router {
        Router::new()
            .fallback(chain_dispatch)
            .with_state(self)
            .layer(TraceLayer::new_for_http())
    }
}

async fn chain_dispatch(State(chain): State<HandlerChain>, request: Request) -> Response {
    chain.dispatch(request).await
}

// ─── Listener ─────────────────────────────────────────────────────────────────

/// A bound HTTP listener serving a [`HandlerChain`].
///
/// The serve loop stops when the listener is dropped or [`shutdown`](Self::shutdown)
/// is called.
pub struct HttpListener {
    local_addr: SocketAddr,
    chain: HandlerChain,
    shutdown_token: CancellationToken,
}

impl HttpListener {
    /// Returns the address the OS actually bound (includes ephemeral port).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the handler chain served by this listener.
    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    /// Mounts a handler; cancelling the returned handle unmounts it.
    pub fn mount(&self, name: impl Into<String>, handler: BoxedRequestHandler) -> ListenerHandle {
        let name = name.into();
        self.chain.push(name.clone(), handler);
        info!(handler = %name, addr = %self.local_addr, "Registered HTTP handler");

        let handle_id = format!("http-{}-{}", self.local_addr, name);
        let token = self.shutdown_token.child_token();
        let token_clone = token.clone();
        let chain = self.chain.clone();

        tokio::spawn(async move {
            token_clone.cancelled().await;
            chain.remove(&name);
            info!(handler = %name, "Unregistered HTTP handler");
        });

        ListenerHandle::new(handle_id, token)
    }

    /// Returns a token cancelled when the listener shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Stops serving.
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }
}

impl Drop for HttpListener {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

/// Binds `addr` and starts serving an empty handler chain.
pub async fn listen(addr: &str) -> TransportResult<HttpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| TransportError::BindFailed {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
    let local_addr = listener.local_addr()?;

    let chain = HandlerChain::new();
    let router = chain.clone().into_router();
    let shutdown_token = CancellationToken::new();
    let serve_token = shutdown_token.clone();

    tokio::spawn(async move {
        let server = axum::serve(listener, router);
        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!(error = %e, "HTTP server error");
                }
            }
            () = serve_token.cancelled() => {
                info!(addr = %local_addr, "HTTP server shutting down");
            }
        }
    });

    info!(addr = %local_addr, "HTTP server listening");

    Ok(HttpListener {
        local_addr,
        chain,
        shutdown_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use tower::ServiceExt;

    /// Answers one exact path, declines everything else.
    struct PathHandler {
        path: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl RequestHandler for PathHandler {
        async fn handle(&self, request: Request) -> Dispatch {
            if request.uri().path() == self.path {
                Dispatch::Handled((StatusCode::OK, self.reply).into_response())
            } else {
                Dispatch::Declined(request)
            }
        }
    }

    fn get(path: &str) -> Request {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_declined_request_reaches_next_handler() {
        let chain = HandlerChain::new();
        chain.push("a", Arc::new(PathHandler { path: "/a", reply: "A" }));
        chain.push("b", Arc::new(PathHandler { path: "/b", reply: "B" }));

        let response = chain.clone().into_router().oneshot(get("/b")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "B");
    }

    #[tokio::test]
    async fn test_all_declined_is_not_found() {
        let chain = HandlerChain::new();
        chain.push("a", Arc::new(PathHandler { path: "/a", reply: "A" }));

        let response = chain.into_router().oneshot(get("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, r#"{"error":"Not Found"}"#);
    }

    #[tokio::test]
    async fn test_first_handler_wins() {
        let chain = HandlerChain::new();
        chain.push("first", Arc::new(PathHandler { path: "/a", reply: "first" }));
        chain.push("second", Arc::new(PathHandler { path: "/a", reply: "second" }));

        let response = chain.into_router().oneshot(get("/a")).await.unwrap();
        assert_eq!(body_text(response).await, "first");
    }

    #[test]
    fn test_remove_by_name() {
        let chain = HandlerChain::new();
        chain.push("a", Arc::new(PathHandler { path: "/a", reply: "A" }));
        assert_eq!(chain.len(), 1);
        assert!(chain.remove("a"));
        assert!(!chain.remove("a"));
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn test_listen_and_unmount() {
        let listener = listen("127.0.0.1:0").await.unwrap();
        assert_ne!(listener.local_addr().port(), 0);

        let handle = listener.mount("a", Arc::new(PathHandler { path: "/a", reply: "A" }));
        assert_eq!(listener.chain().len(), 1);

        handle.stop();
        for _ in 0..50 {
            if listener.chain().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(listener.chain().is_empty());
    }
}
