//! Handler registry.
//!
//! # Responsibilities
//! - Collect route registrations from every pillar at startup
//! - Reject duplicate `(pillar, path, method)` triples loudly
//! - Look up the handler for a request or explain the miss
//!
//! # Design Decisions
//! - Immutable after `build()` (shared via `Arc`, no locks)
//! - O(1) exact-path lookup via HashMap
//! - O(n) template scan per pillar (acceptable for typical route counts)
//! - Explicit `LookupMiss` rather than silent default

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gateway::handler::{Handler, SharedHandler};
use crate::gateway::validation::ParamSchema;
use crate::routing::matcher::{PathParams, PathTemplate, TemplateError};
use crate::routing::{ApiMethod, Pillar, RouteKey};

/// Lifecycle state of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    #[default]
    Active,
    /// Still served, flagged in the envelope.
    Deprecated,
    /// Registered but refused with "route unavailable".
    Maintenance,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Active => "active",
            RouteStatus::Deprecated => "deprecated",
            RouteStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(RouteStatus::Active),
            "deprecated" => Ok(RouteStatus::Deprecated),
            "maintenance" => Ok(RouteStatus::Maintenance),
            other => Err(format!("unknown route status '{}'", other)),
        }
    }
}

/// A route as declared by a pillar module.
pub struct RouteSpec {
    pillar: Pillar,
    path: String,
    method: ApiMethod,
    handler: SharedHandler,
    schema: Option<ParamSchema>,
    status: RouteStatus,
    description: String,
    tags: Vec<String>,
    ui_hints: Vec<String>,
}

impl RouteSpec {
    pub fn new(
        pillar: Pillar,
        path: impl Into<String>,
        method: ApiMethod,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            pillar,
            path: path.into(),
            method,
            handler: Arc::new(handler),
            schema: None,
            status: RouteStatus::Active,
            description: String::new(),
            tags: Vec::new(),
            ui_hints: Vec::new(),
        }
    }

    pub fn get(pillar: Pillar, path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::new(pillar, path, ApiMethod::Get, handler)
    }

    pub fn post(pillar: Pillar, path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::new(pillar, path, ApiMethod::Post, handler)
    }

    pub fn schema(mut self, schema: ParamSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn status(mut self, status: RouteStatus) -> Self {
        self.status = status;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Suggested follow-up actions returned as `next_actions` on success.
    pub fn ui_hint(mut self, action: impl Into<String>) -> Self {
        self.ui_hints.push(action.into());
        self
    }
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("pillar", &self.pillar)
            .field("path", &self.path)
            .field("method", &self.method)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// A compiled registration.
pub struct Route {
    key: RouteKey,
    template: PathTemplate,
    handler: SharedHandler,
    schema: Option<ParamSchema>,
    status: RouteStatus,
    description: String,
    tags: Vec<String>,
    ui_hints: Vec<String>,
}

impl Route {
    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }

    pub fn schema(&self) -> Option<&ParamSchema> {
        self.schema.as_ref()
    }

    /// Status declared at registration, before config overrides.
    pub fn status(&self) -> RouteStatus {
        self.status
    }

    pub fn ui_hints(&self) -> &[String] {
        &self.ui_hints
    }

    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            pillar: self.key.pillar,
            path: self.template.as_str().to_string(),
            method: self.key.method,
            status: self.status,
            description: self.description.clone(),
            tags: self.tags.clone(),
            has_schema: self.schema.is_some(),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("key", &self.key)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Serializable summary of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub pillar: Pillar,
    pub path: String,
    pub method: ApiMethod,
    pub status: RouteStatus,
    pub description: String,
    pub tags: Vec<String>,
    pub has_schema: bool,
}

/// Successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub path_params: PathParams,
}

/// Why a lookup found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupMiss {
    PillarNotFound,
    PathNotFound,
    MethodNotAllowed { allowed: Vec<ApiMethod> },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("route {0} is already registered")]
    Duplicate(RouteKey),

    #[error("invalid path '{path}' for pillar {pillar}: {source}")]
    InvalidTemplate {
        pillar: Pillar,
        path: String,
        #[source]
        source: TemplateError,
    },
}

/// Filter for listing registrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteFilter {
    pub pillar: Option<Pillar>,
    pub status: Option<RouteStatus>,
}

#[derive(Debug, Default)]
struct PillarRoutes {
    exact: HashMap<String, BTreeMap<ApiMethod, Arc<Route>>>,
    templated: Vec<Arc<Route>>,
}

/// Collects registrations during startup.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    pillars: HashMap<Pillar, PillarRoutes>,
    shapes: HashSet<(Pillar, String, ApiMethod)>,
    order: Vec<Arc<Route>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration. Fails if an equivalent triple already exists.
    pub fn register(&mut self, spec: RouteSpec) -> Result<RouteKey, RegistryError> {
        let template =
            PathTemplate::parse(&spec.path).map_err(|source| RegistryError::InvalidTemplate {
                pillar: spec.pillar,
                path: spec.path.clone(),
                source,
            })?;

        let key = RouteKey::new(spec.pillar, spec.path, spec.method);
        if !self
            .shapes
            .insert((key.pillar, template.shape(), key.method))
        {
            return Err(RegistryError::Duplicate(key));
        }

        let route = Arc::new(Route {
            key: key.clone(),
            template,
            handler: spec.handler,
            schema: spec.schema,
            status: spec.status,
            description: spec.description,
            tags: spec.tags,
            ui_hints: spec.ui_hints,
        });

        let pillar = self.pillars.entry(key.pillar).or_default();
        if route.template.is_static() {
            pillar
                .exact
                .entry(key.path.clone())
                .or_default()
                .insert(key.method, route.clone());
        } else {
            pillar.templated.push(route.clone());
        }
        self.order.push(route);

        tracing::debug!(route = %key, "Route registered");
        Ok(key)
    }

    /// Number of routes registered so far for `pillar`.
    pub fn count_for(&self, pillar: Pillar) -> usize {
        self.order.iter().filter(|r| r.key.pillar == pillar).count()
    }

    /// Freeze the registry.
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            pillars: self.pillars,
            order: self.order,
        }
    }
}

/// Immutable mapping from `(pillar, path, method)` to handlers.
#[derive(Debug)]
pub struct HandlerRegistry {
    pillars: HashMap<Pillar, PillarRoutes>,
    order: Vec<Arc<Route>>,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Find the handler for a triple. Exact paths are checked before
    /// templates; templates in registration order.
    pub fn lookup(
        &self,
        pillar: Pillar,
        path: &str,
        method: ApiMethod,
    ) -> Result<RouteMatch, LookupMiss> {
        let routes = self.pillars.get(&pillar).ok_or(LookupMiss::PillarNotFound)?;
        let mut allowed = Vec::new();

        if let Some(by_method) = routes.exact.get(path) {
            if let Some(route) = by_method.get(&method) {
                return Ok(RouteMatch {
                    route: route.clone(),
                    path_params: PathParams::new(),
                });
            }
            allowed.extend(by_method.keys().copied());
        }

        for route in &routes.templated {
            if let Some(path_params) = route.template.matches(path) {
                if route.key.method == method {
                    return Ok(RouteMatch {
                        route: route.clone(),
                        path_params,
                    });
                }
                allowed.push(route.key.method);
            }
        }

        if allowed.is_empty() {
            Err(LookupMiss::PathNotFound)
        } else {
            allowed.sort();
            allowed.dedup();
            Err(LookupMiss::MethodNotAllowed { allowed })
        }
    }

    /// Registrations in registration order.
    pub fn routes(&self, filter: RouteFilter) -> Vec<RouteInfo> {
        self.order
            .iter()
            .filter(|r| filter.pillar.map_or(true, |p| r.key.pillar == p))
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .map(|r| r.info())
            .collect()
    }

    /// Pillars that have at least one route.
    pub fn pillars(&self) -> Vec<Pillar> {
        let mut pillars: Vec<Pillar> = self.pillars.keys().copied().collect();
        pillars.sort();
        pillars
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
