//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Endpoint descriptor ("/api/content/upload-file")
//!     → endpoint.rs (strip prefix, split pillar / path)
//!     → registry.rs (pillar → path → method lookup)
//!     → matcher.rs (evaluate path templates)
//!     → Return: RouteMatch or LookupMiss
//!
//! Registration (at startup):
//!     RouteSpec[] from each pillar module
//!     → RegistryBuilder::register (duplicate + template checks)
//!     → RegistryBuilder::build
//!     → Freeze as immutable HandlerRegistry
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: exact paths beat templates, templates in registration order
//! - Explicit LookupMiss rather than silent default

pub mod endpoint;
pub mod matcher;
pub mod registry;

use std::fmt;
use std::str::FromStr;

use axum::http::Method;
use serde::{Deserialize, Serialize};

pub use endpoint::{parse_endpoint, EndpointParts};
pub use matcher::{PathParams, PathTemplate};
pub use registry::{
    HandlerRegistry, LookupMiss, RegistryBuilder, RegistryError, RouteFilter, RouteInfo,
    RouteMatch, RouteSpec, RouteStatus,
};

/// Business-domain grouping of endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pillar {
    Content,
    Insights,
    Operations,
    BusinessOutcomes,
    Session,
}

impl Pillar {
    pub const ALL: [Pillar; 5] = [
        Pillar::Content,
        Pillar::Insights,
        Pillar::Operations,
        Pillar::BusinessOutcomes,
        Pillar::Session,
    ];

    /// Canonical path segment for this pillar.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Content => "content",
            Pillar::Insights => "insights",
            Pillar::Operations => "operations",
            Pillar::BusinessOutcomes => "business-outcomes",
            Pillar::Session => "session",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known pillar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPillar(pub String);

impl fmt::Display for UnknownPillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown pillar '{}'", self.0)
    }
}

impl std::error::Error for UnknownPillar {}

impl FromStr for Pillar {
    type Err = UnknownPillar;

    /// Accepts `content`, `content-pillar`, `business-outcomes` and
    /// `business_outcomes`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase().replace('_', "-");
        let name = lower.strip_suffix("-pillar").unwrap_or(&lower);
        Pillar::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| UnknownPillar(s.to_string()))
    }
}

/// Methods accepted on the universal endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl ApiMethod {
    pub const ALL: [ApiMethod; 5] = [
        ApiMethod::Get,
        ApiMethod::Post,
        ApiMethod::Put,
        ApiMethod::Delete,
        ApiMethod::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMethod::Get => "GET",
            ApiMethod::Post => "POST",
            ApiMethod::Put => "PUT",
            ApiMethod::Delete => "DELETE",
            ApiMethod::Patch => "PATCH",
        }
    }

    /// Map a transport method; `None` for HEAD, OPTIONS and friends.
    pub fn from_http(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(ApiMethod::Get),
            Method::POST => Some(ApiMethod::Post),
            Method::PUT => Some(ApiMethod::Put),
            Method::DELETE => Some(ApiMethod::Delete),
            Method::PATCH => Some(ApiMethod::Patch),
            _ => None,
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

/// Identity of one registration: the `(pillar, path, method)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteKey {
    pub pillar: Pillar,
    pub path: String,
    pub method: ApiMethod,
}

impl RouteKey {
    pub fn new(pillar: Pillar, path: impl Into<String>, method: ApiMethod) -> Self {
        Self {
            pillar,
            path: path.into(),
            method,
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.method, self.pillar, self.path)
    }
}
