//! Pillar Gateway Library
//!
//! Routes `{prefix}/{pillar}/{path}` requests arriving over HTTP or
//! WebSocket to registered domain handlers and frames every outcome in one
//! response envelope.

// Core subsystems
pub mod config;
pub mod gateway;
pub mod http;
pub mod net;
pub mod pillars;
pub mod routing;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
