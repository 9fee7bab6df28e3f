//! Handler abstraction invoked by the gateway core.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::gateway::error::DomainError;
use crate::gateway::request::HandlerRequest;

/// Outcome of a domain handler: a JSON payload or a domain error that the
/// gateway passes through untouched.
pub type HandlerResult = Result<Value, DomainError>;

/// A domain-specific function implementing one `(pillar, path, method)`.
///
/// Any `Fn(HandlerRequest) -> impl Future<Output = HandlerResult>` is a
/// handler, so plain async functions and closures register directly.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, request: HandlerRequest) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, request: HandlerRequest) -> HandlerResult {
        (self)(request).await
    }
}

/// Handler as stored in the registry.
pub type SharedHandler = Arc<dyn Handler>;
