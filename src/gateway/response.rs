//! Client-facing response envelope.
//!
//! Every outcome, success or failure, is framed the same way so clients
//! can branch on `success` and `ui_state` without inspecting status codes.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gateway::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiState {
    Success,
    Error,
}

/// JSON body returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub api_version: String,
    pub ui_state: UiState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl Envelope {
    pub fn success(data: Value, request_id: &str, api_version: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            message: None,
            violations: Vec::new(),
            details: None,
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            api_version: api_version.to_string(),
            ui_state: UiState::Success,
            next_actions: Vec::new(),
            deprecated: false,
        }
    }

    pub fn failure(error: &GatewayError, request_id: &str, api_version: &str) -> Self {
        let (violations, details) = match error {
            GatewayError::BadRequest { violations } => (violations.clone(), None),
            GatewayError::MethodNotAllowed { allowed, .. } => (
                Vec::new(),
                Some(serde_json::json!({ "allowed": allowed })),
            ),
            GatewayError::Domain(e) => (Vec::new(), e.details.clone()),
            _ => (Vec::new(), None),
        };

        Self {
            success: false,
            data: None,
            error: Some(error.kind().to_string()),
            code: Some(error.code().to_string()),
            message: Some(error.message()),
            violations,
            details,
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            api_version: api_version.to_string(),
            ui_state: UiState::Error,
            next_actions: Vec::new(),
            deprecated: false,
        }
    }

    pub fn with_next_actions(mut self, actions: &[String]) -> Self {
        self.next_actions = actions.to_vec();
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }
}

/// Normalized response handed back to a protocol adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl GatewayResponse {
    pub fn is_success(&self) -> bool {
        self.envelope.success
    }
}
