//! Normalized request shapes.
//!
//! # Responsibilities
//! - `GatewayRequest`: what every protocol adapter hands to the core
//! - `HandlerRequest`: what a handler receives after routing
//! - `CallerContext`: identity forwarded by an upstream auth proxy
//!
//! # Design Decisions
//! - Header keys are stored lowercase so lookups are case-insensitive
//! - The gateway extracts caller identity but never authenticates it
//! - Handlers see `params` exactly as the adapter built them; path
//!   parameters travel separately

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::routing::{ApiMethod, PathParams, Pillar};

/// Request parameters (JSON object).
pub type Params = Map<String, Value>;

/// Request headers keyed by lowercase name.
pub type Headers = BTreeMap<String, String>;

pub const X_USER_ID: &str = "x-user-id";
pub const X_TENANT_ID: &str = "x-tenant-id";
pub const X_USER_ROLES: &str = "x-user-roles";
pub const X_USER_PERMISSIONS: &str = "x-user-permissions";
pub const X_SESSION_TOKEN: &str = "x-session-token";
pub const X_WORKFLOW_ID: &str = "x-workflow-id";

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Transport-independent request built by a protocol adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// Endpoint descriptor, e.g. `/api/content/upload-file`.
    pub endpoint: String,
    pub method: ApiMethod,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default = "new_request_id")]
    pub request_id: String,
}

impl GatewayRequest {
    pub fn new(endpoint: impl Into<String>, method: ApiMethod) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            params: Params::new(),
            headers: Headers::new(),
            request_id: new_request_id(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

/// Identity fields forwarded by an upstream authentication proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallerContext {
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
    /// Correlates multi-step operations across requests.
    pub workflow_id: String,
}

impl CallerContext {
    /// Extract caller identity from forwarded headers.
    ///
    /// The workflow id comes from `params.workflow_id`, then the
    /// `X-Workflow-Id` header, and is generated when neither is present.
    pub fn from_request(headers: &Headers, params: &Params) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let workflow_id = params
            .get("workflow_id")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| header(X_WORKFLOW_ID))
            .unwrap_or_else(new_request_id);

        Self {
            user_id: header(X_USER_ID),
            tenant_id: header(X_TENANT_ID),
            roles: split_list(headers.get(X_USER_ROLES)),
            permissions: split_list(headers.get(X_USER_PERMISSIONS)),
            session_token: header(X_SESSION_TOKEN),
            workflow_id,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

fn split_list(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// What a handler receives once the core has routed and validated a call.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub pillar: Pillar,
    pub path: String,
    pub method: ApiMethod,
    pub params: Params,
    pub path_params: PathParams,
    pub headers: Headers,
    pub caller: CallerContext,
    pub request_id: String,
}

impl HandlerRequest {
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_caller_context_from_forwarded_headers() {
        let h = headers(&[
            (X_USER_ID, "user-1"),
            (X_TENANT_ID, "tenant-9"),
            (X_USER_ROLES, "admin, analyst,"),
            (X_USER_PERMISSIONS, "read,write"),
            (X_SESSION_TOKEN, "tok"),
        ]);
        let ctx = CallerContext::from_request(&h, &Params::new());

        assert_eq!(ctx.user_id.as_deref(), Some("user-1"));
        assert_eq!(ctx.tenant_id.as_deref(), Some("tenant-9"));
        assert_eq!(ctx.roles, vec!["admin", "analyst"]);
        assert!(ctx.has_permission("write"));
        assert!(!ctx.is_anonymous());
        assert_eq!(ctx.session_token.as_deref(), Some("tok"));
        assert!(!ctx.workflow_id.is_empty());
    }

    #[test]
    fn test_workflow_id_precedence() {
        let h = headers(&[(X_WORKFLOW_ID, "from-header")]);

        let mut params = Params::new();
        params.insert("workflow_id".into(), json!("from-body"));
        assert_eq!(CallerContext::from_request(&h, &params).workflow_id, "from-body");

        assert_eq!(
            CallerContext::from_request(&h, &Params::new()).workflow_id,
            "from-header"
        );

        let a = CallerContext::from_request(&Headers::new(), &Params::new());
        let b = CallerContext::from_request(&Headers::new(), &Params::new());
        assert_ne!(a.workflow_id, b.workflow_id);
    }

    #[test]
    fn test_anonymous_caller_and_session_token_not_serialized() {
        let h = headers(&[(X_SESSION_TOKEN, "secret")]);
        let ctx = CallerContext::from_request(&h, &Params::new());
        assert!(ctx.is_anonymous());

        let value = serde_json::to_value(&ctx).unwrap();
        assert!(value.get("session_token").is_none());
    }

    #[test]
    fn test_with_header_lowercases() {
        let req = GatewayRequest::new("/api/content/x", ApiMethod::Get)
            .with_header("X-User-Id", "u");
        assert_eq!(req.headers.get("x-user-id").map(String::as_str), Some("u"));
    }
}
