//! Response framing for the HTTP adapter.
//!
//! The envelope is the body; `GatewayResponse.status` is the status line.
//! Deprecated routes also carry a `Deprecation: true` header.

use axum::{
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::gateway::GatewayResponse;

pub const DEPRECATION: &str = "deprecation";

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let deprecated = self.envelope.deprecated;
        let mut response = (self.status, Json(self.envelope)).into_response();
        if deprecated {
            response.headers_mut().insert(
                HeaderName::from_static(DEPRECATION),
                HeaderValue::from_static("true"),
            );
        }
        response
    }
}
