//! Gateway core: routing, validation and response shaping shared by every
//! protocol adapter.
//!
//! # Data Flow
//! ```text
//! GatewayRequest (from HTTP / WebSocket adapter)
//!     → parse endpoint           (MalformedEndpoint)
//!     → registry lookup          (PillarNotFound / PathNotFound / MethodNotAllowed)
//!     → effective route status   (RouteUnavailable)
//!     → parameter schema         (BadRequest)
//!     → handler.call()           (DomainError passed through, Timeout,
//!                                 panic → INTERNAL_ERROR)
//!     → Envelope
//! GatewayResponse (back to the adapter)
//! ```
//!
//! # Design Decisions
//! - Single attempt: no retries, no caching
//! - Local failures never reach a handler
//! - Registry is frozen; only status overrides can change at runtime

pub mod error;
pub mod handler;
pub mod request;
pub mod response;
pub mod stats;
pub mod validation;

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::http::StatusCode;
use futures_util::FutureExt;
use serde_json::Value;
use tracing::Instrument;

use crate::config::schema::{RouteOverride, RoutingConfig};
use crate::observability::{metrics, spans};
use crate::routing::{
    parse_endpoint, ApiMethod, HandlerRegistry, LookupMiss, Pillar, RouteFilter, RouteInfo,
    RouteKey, RouteStatus,
};

pub use error::{DomainError, GatewayError};
pub use handler::{Handler, HandlerResult, SharedHandler};
pub use request::{CallerContext, GatewayRequest, HandlerRequest, Headers, Params};
pub use response::{Envelope, GatewayResponse, UiState};
pub use stats::{GatewayStats, StatsSnapshot};
pub use validation::{FieldKind, ParamSchema};

type StatusOverrides = HashMap<RouteKey, RouteStatus>;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Successful dispatch before it is framed.
struct Dispatched {
    data: Value,
    ui_hints: Vec<String>,
    deprecated: bool,
}

/// The routing core.
pub struct Gateway {
    registry: Arc<HandlerRegistry>,
    prefix: String,
    api_version: String,
    overrides: ArcSwap<StatusOverrides>,
    stats: GatewayStats,
    request_timeout: Duration,
}

impl Gateway {
    pub fn new(registry: HandlerRegistry, config: &RoutingConfig) -> Self {
        let gateway = Self {
            registry: Arc::new(registry),
            prefix: config.api_prefix.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            overrides: ArcSwap::from_pointee(StatusOverrides::new()),
            stats: GatewayStats::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };
        gateway.apply_overrides(&config.route_overrides);
        gateway
    }

    /// Upper bound on a single handler invocation.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &GatewayStats {
        &self.stats
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Replace the runtime status overrides. Entries naming an unknown
    /// pillar or method are skipped.
    pub fn apply_overrides(&self, overrides: &[RouteOverride]) {
        let mut table = StatusOverrides::new();
        for o in overrides {
            match (o.pillar.parse::<Pillar>(), o.method.parse::<ApiMethod>()) {
                (Ok(pillar), Ok(method)) => {
                    table.insert(RouteKey::new(pillar, o.path.clone(), method), o.status);
                }
                _ => tracing::warn!(
                    pillar = %o.pillar,
                    path = %o.path,
                    method = %o.method,
                    "Ignoring route override for unknown pillar or method"
                ),
            }
        }
        tracing::info!(overrides = table.len(), "Route status overrides applied");
        self.overrides.store(Arc::new(table));
    }

    /// Status after applying overrides.
    pub fn effective_status(&self, key: &RouteKey, registered: RouteStatus) -> RouteStatus {
        self.overrides.load().get(key).copied().unwrap_or(registered)
    }

    /// Registrations with their effective status.
    pub fn routes(&self, filter: RouteFilter) -> Vec<RouteInfo> {
        let overrides = self.overrides.load();
        self.registry
            .routes(RouteFilter {
                pillar: filter.pillar,
                status: None,
            })
            .into_iter()
            .map(|mut info| {
                let key = RouteKey::new(info.pillar, info.path.clone(), info.method);
                if let Some(status) = overrides.get(&key) {
                    info.status = *status;
                }
                info
            })
            .filter(|info| filter.status.map_or(true, |s| info.status == s))
            .collect()
    }

    /// Route one normalized request to its handler and frame the result.
    pub async fn route(&self, request: GatewayRequest) -> GatewayResponse {
        let span = spans::request_span(&request.request_id, request.method, &request.endpoint);
        async move {
            let start = Instant::now();
            let request_id = request.request_id.clone();
            let endpoint = request.endpoint.clone();
            let method = request.method;

            let (route, outcome) = self.dispatch(request).await;
            let response = match outcome {
                Ok(done) => GatewayResponse {
                    status: StatusCode::OK,
                    envelope: Envelope::success(done.data, &request_id, &self.api_version)
                        .with_next_actions(&done.ui_hints)
                        .with_deprecated(done.deprecated),
                },
                Err(error) => {
                    if error.is_local() {
                        tracing::warn!(
                            endpoint = %endpoint,
                            method = %method,
                            error = %error,
                            "Request rejected"
                        );
                    } else {
                        tracing::info!(
                            endpoint = %endpoint,
                            method = %method,
                            code = error.code(),
                            "Handler returned domain error"
                        );
                    }
                    self.frame_error(&error, &request_id)
                }
            };

            self.observe(route.as_ref(), Some(method), &response, start);
            tracing::debug!(
                status = response.status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );
            response
        }
        .instrument(span)
        .await
    }

    /// Frame a failure detected by an adapter before routing (unreadable
    /// body, unsupported transport method).
    pub fn reject(&self, error: GatewayError, request_id: &str) -> GatewayResponse {
        let start = Instant::now();
        tracing::warn!(request_id = %request_id, error = %error, "Request rejected by adapter");
        let response = self.frame_error(&error, request_id);
        self.observe(None, None, &response, start);
        response
    }

    fn frame_error(&self, error: &GatewayError, request_id: &str) -> GatewayResponse {
        GatewayResponse {
            status: error.status(),
            envelope: Envelope::failure(error, request_id, &self.api_version),
        }
    }

    fn observe(
        &self,
        route: Option<&RouteKey>,
        method: Option<ApiMethod>,
        response: &GatewayResponse,
        start: Instant,
    ) {
        let code = response.envelope.code.as_deref();
        self.stats.record(route, code, start.elapsed());

        let pillar = route.map(|k| k.pillar.as_str()).unwrap_or("unknown");
        let method = method.map(|m| m.as_str()).unwrap_or("OTHER");
        metrics::record_request(pillar, method, response.status.as_u16(), start);
        if let Some(code) = code {
            metrics::record_error(code);
        }
    }

    async fn dispatch(
        &self,
        request: GatewayRequest,
    ) -> (Option<RouteKey>, Result<Dispatched, GatewayError>) {
        // 1. Parse endpoint
        let Some(parts) = parse_endpoint(&request.endpoint, &self.prefix) else {
            let error = GatewayError::MalformedEndpoint {
                endpoint: request.endpoint.clone(),
                prefix: self.prefix.clone(),
            };
            return (None, Err(error));
        };

        // 2. Look up (pillar, path, method)
        let Ok(pillar) = parts.pillar.parse::<Pillar>() else {
            let error = GatewayError::PillarNotFound {
                pillar: parts.pillar.to_string(),
            };
            return (None, Err(error));
        };
        let path = parts.path.to_string();

        let matched = match self.registry.lookup(pillar, &path, request.method) {
            Ok(m) => m,
            Err(LookupMiss::PillarNotFound) => {
                let error = GatewayError::PillarNotFound {
                    pillar: parts.pillar.to_string(),
                };
                return (None, Err(error));
            }
            Err(LookupMiss::PathNotFound) => {
                return (None, Err(GatewayError::PathNotFound { pillar, path }));
            }
            Err(LookupMiss::MethodNotAllowed { allowed }) => {
                let error = GatewayError::MethodNotAllowed {
                    pillar,
                    path,
                    method: request.method,
                    allowed,
                };
                return (None, Err(error));
            }
        };

        let route = matched.route;
        let key = route.key().clone();
        let status = self.effective_status(&key, route.status());
        match status {
            RouteStatus::Maintenance => {
                return (Some(key.clone()), Err(GatewayError::RouteUnavailable { route: key }));
            }
            RouteStatus::Deprecated => {
                tracing::warn!(route = %key, "Deprecated route called");
            }
            RouteStatus::Active => {}
        }

        // 3. Validate parameters
        if let Some(schema) = route.schema() {
            if let Err(violations) = schema.validate(&request.params) {
                return (Some(key), Err(GatewayError::BadRequest { violations }));
            }
        }

        // 4. Invoke handler
        let caller = CallerContext::from_request(&request.headers, &request.params);
        let handler_request = HandlerRequest {
            pillar,
            path,
            method: request.method,
            params: request.params,
            path_params: matched.path_params,
            headers: request.headers,
            caller,
            request_id: request.request_id,
        };

        // 4b. Bounded by the request timeout; a panic fails this call only.
        let call = AssertUnwindSafe(route.handler().call(handler_request)).catch_unwind();
        let outcome = match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => {
                tracing::error!(
                    route = %key,
                    panic = %panic_message(panic.as_ref()),
                    "Handler panicked"
                );
                Err(DomainError::internal("handler failed unexpectedly"))
            }
            Err(_) => {
                let error = GatewayError::Timeout {
                    route: key.clone(),
                    timeout_ms: self.request_timeout.as_millis() as u64,
                };
                return (Some(key), Err(error));
            }
        };

        // 5. Transform
        match outcome {
            Ok(data) => (
                Some(key),
                Ok(Dispatched {
                    data,
                    ui_hints: route.ui_hints().to_vec(),
                    deprecated: status == RouteStatus::Deprecated,
                }),
            ),
            Err(domain) => (Some(key), Err(GatewayError::Domain(domain))),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
