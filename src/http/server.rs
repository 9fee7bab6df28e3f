//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway and WebSocket handlers
//! - Wire up middleware (tracing, request ID)
//! - Serve plain TCP or TLS with graceful shutdown
//! - Apply reloaded route status overrides

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::schema::WebSocketConfig;
use crate::config::GatewayConfig;
use crate::gateway::Gateway;
use crate::http::request::{into_gateway_request, RequestIdExt, RequestIdLayer};
use crate::http::websocket::{ws_handler, ws_method_not_allowed};
use crate::routing::HandlerRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub websocket: WebSocketConfig,
    pub max_body_size: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    gateway: Arc<Gateway>,
}

impl HttpServer {
    /// Create a new HTTP server from configuration and a frozen registry.
    pub fn new(config: GatewayConfig, registry: HandlerRegistry) -> Self {
        let gateway = Arc::new(
            Gateway::new(registry, &config.gateway)
                .with_request_timeout(Duration::from_secs(config.timeouts.request_secs)),
        );
        let state = AppState {
            gateway: gateway.clone(),
            websocket: config.websocket.clone(),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            gateway,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Timeouts and body limits are enforced by the gateway core and
    /// `into_gateway_request`, so every rejection is an envelope.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new();
        if config.websocket.enabled {
            router = router.route(
                &config.websocket.path,
                get(ws_handler).fallback(ws_method_not_allowed),
            );
        }

        router
            .fallback(gateway_handler)
            .with_state(state)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Shared routing core.
    pub fn gateway(&self) -> Arc<Gateway> {
        self.gateway.clone()
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.gateway.registry().len(),
            "HTTP server starting"
        );

        tokio::spawn(apply_config_updates(self.gateway.clone(), config_updates));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on `addr`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        tokio::spawn(apply_config_updates(self.gateway.clone(), config_updates));

        let handle = Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Apply each reloaded config's route overrides until the channel closes.
async fn apply_config_updates(
    gateway: Arc<Gateway>,
    mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
) {
    while let Some(config) = updates.recv().await {
        if config.gateway.api_prefix.trim_end_matches('/') != gateway.prefix() {
            tracing::warn!(
                current = %gateway.prefix(),
                configured = %config.gateway.api_prefix,
                "API prefix changes take effect after restart"
            );
        }
        gateway.apply_overrides(&config.gateway.route_overrides);
    }
}

/// Every non-WebSocket request goes to the routing core.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .request_id()
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    match into_gateway_request(request, &request_id, state.max_body_size).await {
        Ok(req) => state.gateway.route(req).await.into_response(),
        Err(error) => state.gateway.reject(error, &request_id).into_response(),
    }
}
