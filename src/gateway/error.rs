//! Gateway and domain error types.
//!
//! Local failures (malformed endpoint, lookup misses, validation) are
//! produced by the core before any handler runs. `DomainError` is what a
//! handler returns; the core passes it through without reclassifying it.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::routing::{ApiMethod, Pillar, RouteKey};

/// Error raised by a domain handler.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct DomainError {
    pub code: String,
    pub message: String,
    pub status: StatusCode,
    pub details: Option<Value>,
}

impl DomainError {
    /// New domain error with status 422 Unprocessable Entity.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: StatusCode::UNPROCESSABLE_ENTITY,
            details: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message).with_status(StatusCode::NOT_FOUND)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("SERVICE_UNAVAILABLE", message).with_status(StatusCode::SERVICE_UNAVAILABLE)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message).with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Every way a routed call can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("malformed endpoint '{endpoint}', expected {prefix}/{{pillar}}/{{path}}")]
    MalformedEndpoint { endpoint: String, prefix: String },

    #[error("pillar '{pillar}' is not registered")]
    PillarNotFound { pillar: String },

    #[error("path '{path}' is not registered for pillar '{pillar}'")]
    PathNotFound { pillar: Pillar, path: String },

    #[error("method {method} is not allowed for {pillar}/{path}")]
    MethodNotAllowed {
        pillar: Pillar,
        path: String,
        method: ApiMethod,
        allowed: Vec<ApiMethod>,
    },

    #[error("method {method} is not supported by the gateway")]
    UnsupportedMethod { method: String },

    #[error("invalid request: {}", .violations.join("; "))]
    BadRequest { violations: Vec<String> },

    #[error("route {route} is under maintenance")]
    RouteUnavailable { route: RouteKey },

    #[error("route {route} did not complete within {timeout_ms} ms")]
    Timeout { route: RouteKey, timeout_ms: u64 },

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl GatewayError {
    pub fn bad_request(violation: impl Into<String>) -> Self {
        GatewayError::BadRequest {
            violations: vec![violation.into()],
        }
    }

    /// Short, stable description used as the envelope `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::MalformedEndpoint { .. } => "malformed endpoint",
            GatewayError::PillarNotFound { .. } => "pillar not found",
            GatewayError::PathNotFound { .. } => "path not found",
            GatewayError::MethodNotAllowed { .. } | GatewayError::UnsupportedMethod { .. } => {
                "method not allowed"
            }
            GatewayError::BadRequest { .. } => "bad request",
            GatewayError::RouteUnavailable { .. } => "route unavailable",
            GatewayError::Timeout { .. } => "request timeout",
            GatewayError::PayloadTooLarge { .. } => "payload too large",
            GatewayError::Domain(_) => "domain error",
        }
    }

    /// Machine-readable code. Domain errors keep their own code.
    pub fn code(&self) -> &str {
        match self {
            GatewayError::MalformedEndpoint { .. } => "MALFORMED_ENDPOINT",
            GatewayError::PillarNotFound { .. } => "PILLAR_NOT_FOUND",
            GatewayError::PathNotFound { .. } => "PATH_NOT_FOUND",
            GatewayError::MethodNotAllowed { .. } | GatewayError::UnsupportedMethod { .. } => {
                "METHOD_NOT_ALLOWED"
            }
            GatewayError::BadRequest { .. } => "BAD_REQUEST",
            GatewayError::RouteUnavailable { .. } => "ROUTE_UNAVAILABLE",
            GatewayError::Timeout { .. } => "REQUEST_TIMEOUT",
            GatewayError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            GatewayError::Domain(e) => &e.code,
        }
    }

    /// Transport status for adapters that have one.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MalformedEndpoint { .. } | GatewayError::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::PillarNotFound { .. } | GatewayError::PathNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            GatewayError::MethodNotAllowed { .. } | GatewayError::UnsupportedMethod { .. } => {
                StatusCode::METHOD_NOT_ALLOWED
            }
            GatewayError::RouteUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Domain(e) => e.status,
        }
    }

    /// Human-readable detail for the envelope `message` field.
    pub fn message(&self) -> String {
        match self {
            GatewayError::Domain(e) => e.message.clone(),
            other => other.to_string(),
        }
    }

    /// True for failures raised by the gateway itself rather than a handler.
    pub fn is_local(&self) -> bool {
        !matches!(self, GatewayError::Domain(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_statuses() {
        let e = GatewayError::PillarNotFound {
            pillar: "unknown-pillar".into(),
        };
        assert_eq!(e.kind(), "pillar not found");
        assert_eq!(e.code(), "PILLAR_NOT_FOUND");
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert!(e.is_local());

        let e = GatewayError::MalformedEndpoint {
            endpoint: "/api".into(),
            prefix: "/api".into(),
        };
        assert_eq!(e.kind(), "malformed endpoint");
        assert_eq!(e.to_string(), "malformed endpoint '/api', expected /api/{pillar}/{path}");
    }

    #[test]
    fn test_domain_error_passes_through() {
        let domain = DomainError::new("FILE_TOO_LARGE", "file exceeds quota")
            .with_status(StatusCode::PAYLOAD_TOO_LARGE);
        let e = GatewayError::from(domain);

        assert_eq!(e.kind(), "domain error");
        assert_eq!(e.code(), "FILE_TOO_LARGE");
        assert_eq!(e.message(), "file exceeds quota");
        assert_eq!(e.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!e.is_local());
    }

    #[test]
    fn test_timeout_and_payload_limits() {
        let e = GatewayError::Timeout {
            route: RouteKey::new(Pillar::Operations, "slow", ApiMethod::Get),
            timeout_ms: 1500,
        };
        assert_eq!(e.kind(), "request timeout");
        assert_eq!(e.code(), "REQUEST_TIMEOUT");
        assert_eq!(e.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(e.message(), "route GET operations/slow did not complete within 1500 ms");

        let e = GatewayError::PayloadTooLarge { limit: 16 };
        assert_eq!(e.kind(), "payload too large");
        assert_eq!(e.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(e.is_local());
    }

    #[test]
    fn test_bad_request_message_joins_violations() {
        let e = GatewayError::BadRequest {
            violations: vec!["a".into(), "b".into()],
        };
        assert_eq!(e.message(), "invalid request: a; b");
    }
}
