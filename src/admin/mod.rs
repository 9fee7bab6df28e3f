//! Admin API: status, route listing, statistics (with reset) and health,
//! behind a bearer key. Served on its own listener.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::gateway::Gateway;

#[derive(Clone)]
pub struct AdminState {
    pub gateway: Arc<Gateway>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/stats", get(get_stats))
        .route("/admin/stats/reset", post(reset_stats))
        .route("/admin/health", get(get_health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}

/// Serve the admin API until shutdown is signalled.
pub async fn serve_admin(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API starting");
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;
    tracing::info!("Admin API stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::gateway::{GatewayRequest, HandlerRequest};
    use crate::routing::{ApiMethod, Pillar, RegistryBuilder, RouteSpec};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router() -> Router {
        setup_admin_router(state())
    }

    fn state() -> AdminState {
        let mut b = RegistryBuilder::new();
        b.register(RouteSpec::get(
            Pillar::Content,
            "list-files",
            |_req: HandlerRequest| async move { Ok(json!([])) },
        ))
        .unwrap();
        b.register(RouteSpec::get(
            Pillar::Insights,
            "analyze",
            |_req: HandlerRequest| async move { Ok(json!({})) },
        ))
        .unwrap();
        let gateway = Arc::new(Gateway::new(b.build(), &RoutingConfig::default()));
        AdminState {
            gateway,
            api_key: Arc::from("secret"),
        }
    }

    async fn get(router: Router, uri: &str, key: Option<&str>) -> (StatusCode, Value) {
        send(router, "GET", uri, key).await
    }

    async fn send(
        router: Router,
        method: &str,
        uri: &str,
        key: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header("authorization", format!("Bearer {}", key));
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_requires_key() {
        let (status, _) = get(router(), "/admin/status", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = get(router(), "/admin/status", Some("wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_status() {
        let (status, body) = get(router(), "/admin/status", Some("secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["routes"], json!(2));
        assert_eq!(body["pillars"], json!(["content", "insights"]));
    }

    #[tokio::test]
    async fn test_routes_filter() {
        let (status, body) =
            get(router(), "/admin/routes?pillar=insights-pillar", Some("secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["path"], json!("analyze"));

        let (status, _) = get(router(), "/admin/routes?status=retired", Some("secret")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_and_stats() {
        let (status, body) = get(router(), "/admin/health", Some("secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("healthy"));
        assert_eq!(body["pillars"].as_array().unwrap().len(), 2);

        let (status, body) = get(router(), "/admin/stats", Some("secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_requests"], json!(0));
    }

    #[tokio::test]
    async fn test_stats_reset() {
        let state = state();
        state
            .gateway
            .route(GatewayRequest::new("/api/content/list-files", ApiMethod::Get))
            .await;
        state
            .gateway
            .route(GatewayRequest::new("/api/content/missing", ApiMethod::Get))
            .await;

        let (status, _) = send(
            setup_admin_router(state.clone()),
            "POST",
            "/admin/stats/reset",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.gateway.stats().snapshot().total_requests, 2);

        let (status, body) = send(
            setup_admin_router(state.clone()),
            "POST",
            "/admin/stats/reset",
            Some("secret"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_requests"], json!(0));
        assert_eq!(body["routes"], json!([]));
        assert_eq!(state.gateway.stats().snapshot().total_requests, 0);
    }
}
