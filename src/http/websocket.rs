//! WebSocket adapter.
//!
//! # Data Flow
//! ```text
//! Client ── {id, endpoint, method, params, headers} ──→ Gateway::route
//! Client ←────────── {id, status, body: envelope} ─────────┘
//! ```
//!
//! # Design Decisions
//! - One reply frame per request frame, in order
//! - Unparsable frames get a "bad request" reply with `id: null`; the
//!   session stays open
//! - Ping/pong is answered by the protocol layer
//! - A failed upgrade or a non-GET on the socket path is answered with an
//!   envelope like any other rejection

use std::collections::BTreeMap;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::gateway::{Envelope, Gateway, GatewayError, GatewayRequest, Headers, Params};
use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::ApiMethod;

/// One request frame.
#[derive(Debug, Clone, Deserialize)]
pub struct WsRequest {
    #[serde(default)]
    pub id: Value,
    pub endpoint: String,
    pub method: String,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// One reply frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsReply {
    pub id: Value,
    pub status: u16,
    pub body: Envelope,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, state)),
        Err(rejection) => {
            let error =
                GatewayError::bad_request(format!("websocket upgrade failed: {}", rejection));
            state
                .gateway
                .reject(error, &request_id(&headers))
                .into_response()
        }
    }
}

/// Any method other than GET on the socket path.
pub async fn ws_method_not_allowed(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let error = GatewayError::UnsupportedMethod {
        method: method.to_string(),
    };
    state
        .gateway
        .reject(error, &request_id(&headers))
        .into_response()
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .request_id()
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Keeps the open-connection gauge balanced however the session ends.
struct SessionGuard;

impl SessionGuard {
    fn open() -> Self {
        metrics::ws_connection_opened();
        tracing::debug!("WebSocket session opened");
        SessionGuard
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        metrics::ws_connection_closed();
        tracing::debug!("WebSocket session closed");
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let max = state.websocket.max_message_size;
    let _session = SessionGuard::open();

    while let Some(message) = socket.recv().await {
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket receive failed");
                break;
            }
        };

        let reply = match message {
            Message::Text(text) => handle_frame(&state.gateway, text.as_str(), max).await,
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => handle_frame(&state.gateway, text, max).await,
                Err(_) => reject_frame(&state.gateway, Value::Null, "binary frame is not UTF-8"),
            },
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        let payload = match serde_json::to_string(&reply) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode WebSocket reply");
                break;
            }
        };
        if socket.send(Message::Text(payload.into())).await.is_err() {
            break;
        }
    }
}

/// Route one text frame and build its reply.
pub async fn handle_frame(gateway: &Gateway, text: &str, max_message_size: usize) -> WsReply {
    if text.len() > max_message_size {
        return reject_frame(
            gateway,
            Value::Null,
            format!("message exceeds {} bytes", max_message_size),
        );
    }

    let raw: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return reject_frame(gateway, Value::Null, format!("invalid JSON: {}", e)),
    };
    let id = raw.get("id").cloned().unwrap_or(Value::Null);

    let frame: WsRequest = match serde_json::from_value(raw) {
        Ok(f) => f,
        Err(e) => return reject_frame(gateway, id, format!("invalid message: {}", e)),
    };

    let request_id = Uuid::new_v4().to_string();
    let method = match frame.method.parse::<ApiMethod>() {
        Ok(m) => m,
        Err(_) => {
            let error = GatewayError::UnsupportedMethod {
                method: frame.method,
            };
            let response = gateway.reject(error, &request_id);
            return WsReply {
                id,
                status: response.status.as_u16(),
                body: response.envelope,
            };
        }
    };

    let headers: Headers = frame
        .headers
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect();
    let request = GatewayRequest {
        endpoint: frame.endpoint,
        method,
        params: frame.params,
        headers,
        request_id,
    };

    let response = gateway.route(request).await;
    WsReply {
        id,
        status: response.status.as_u16(),
        body: response.envelope,
    }
}

fn reject_frame(gateway: &Gateway, id: Value, violation: impl Into<String>) -> WsReply {
    let request_id = Uuid::new_v4().to_string();
    let response = gateway.reject(GatewayError::bad_request(violation), &request_id);
    WsReply {
        id,
        status: response.status.as_u16(),
        body: response.envelope,
    }
}
