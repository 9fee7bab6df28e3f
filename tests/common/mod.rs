//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use pillar_gateway::admin::{serve_admin, AdminState};
use pillar_gateway::config::GatewayConfig;
use pillar_gateway::gateway::{DomainError, FieldKind, Gateway, HandlerRequest, ParamSchema};
use pillar_gateway::lifecycle::startup::build_registry;
use pillar_gateway::routing::{ApiMethod, HandlerRegistry, Pillar, RouteSpec};
use pillar_gateway::{HttpServer, Shutdown};

pub const ADMIN_KEY: &str = "test-admin-key";

/// A gateway running on an ephemeral local port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub gateway: Arc<Gateway>,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<GatewayConfig>,
}

impl TestGateway {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn admin_url(&self) -> String {
        format!("http://{}", self.admin_addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Business routes shared by the integration suites.
pub fn test_registry() -> HandlerRegistry {
    build_registry(|b| {
        b.register(
            RouteSpec::post(Pillar::Content, "upload-file", |req: HandlerRequest| async move {
                Ok(json!({
                    "file_id": "f-1",
                    "filename": req.params["filename"],
                }))
            })
            .schema(ParamSchema::new().required("filename", FieldKind::String).non_empty())
            .ui_hint("parse_file"),
        )?;
        b.register(RouteSpec::new(
            Pillar::Content,
            "delete-file/{file_id}",
            ApiMethod::Delete,
            |req: HandlerRequest| async move {
                Ok(json!({ "deleted": req.path_param("file_id") }))
            },
        ))?;
        b.register(RouteSpec::get(
            Pillar::Content,
            "files/{name}",
            |req: HandlerRequest| async move { Ok(json!({ "name": req.path_param("name") })) },
        ))?;
        b.register(RouteSpec::post(
            Pillar::Insights,
            "analyze",
            |req: HandlerRequest| async move {
                Ok(json!({
                    "user_id": req.caller.user_id,
                    "tenant_id": req.caller.tenant_id,
                    "params": req.params,
                }))
            },
        ))?;
        b.register(RouteSpec::get(
            Pillar::Operations,
            "slow",
            |_req: HandlerRequest| async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(json!("late"))
            },
        ))?;
        b.register(RouteSpec::get(
            Pillar::Operations,
            "fail",
            |_req: HandlerRequest| async move {
                Err(DomainError::new("SOP_INVALID", "workflow could not be generated"))
            },
        ))?;
        b.register(RouteSpec::get(
            Pillar::Operations,
            "boom",
            |_req: HandlerRequest| async move {
                let steps: Vec<u32> = Vec::new();
                Ok(json!(steps[steps.len() + 1]))
            },
        ))?;
        Ok(())
    })
    .unwrap()
}

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config.admin.bind_address = "127.0.0.1:0".to_string();
    config
}

/// Start the gateway and its admin API.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();

    let server = HttpServer::new(config.clone(), test_registry());
    let gateway = server.gateway();

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    let admin_listener = TcpListener::bind(&config.admin.bind_address).await.unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();
    let state = AdminState {
        gateway: gateway.clone(),
        api_key: Arc::from(config.admin.api_key.as_str()),
    };
    let admin_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = serve_admin(admin_listener, state, admin_shutdown).await;
    });

    TestGateway {
        addr,
        admin_addr,
        gateway,
        shutdown,
        config_updates: config_tx,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
