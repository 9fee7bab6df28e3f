//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, body + query → GatewayRequest)
//!     → gateway core (route)
//!     → response.rs (envelope → status + JSON body)
//!     → Send to client
//!
//! GET /ws
//!     → websocket.rs (one JSON frame in, one JSON frame out)
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use websocket::{WsReply, WsRequest};
