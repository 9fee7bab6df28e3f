//! Pillar Gateway
//!
//! Single entry point in front of the platform's pillar services.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌───────────────────────────────────────────────────┐
//!                              │                    GATEWAY                         │
//!     HTTP  /api/{pillar}/...  │  ┌─────────┐    ┌──────────┐    ┌──────────────┐  │
//!     ─────────────────────────┼─▶│  http   │───▶│ gateway  │───▶│   handler    │  │
//!     WebSocket /ws            │  │ adapter │    │   core   │    │   registry   │  │
//!     ─────────────────────────┼─▶│   ws    │    │          │    │  (frozen)    │  │
//!                              │  └─────────┘    └────┬─────┘    └──────┬───────┘  │
//!                              │                      │                 ▼          │
//!     Envelope                 │                      │          ┌──────────────┐  │
//!     ◀────────────────────────┼──────────────────────┘◀─────────│domain handler│  │
//!                              │                                 └──────────────┘  │
//!                              │  ┌─────────────────────────────────────────────┐  │
//!                              │  │ config + watcher │ observability │ admin API │  │
//!                              │  └─────────────────────────────────────────────┘  │
//!                              └───────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use pillar_gateway::admin::{serve_admin, AdminState};
use pillar_gateway::config::watcher::ConfigWatcher;
use pillar_gateway::lifecycle::startup;
use pillar_gateway::net::load_tls_config;
use pillar_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "pillar-gateway", version)]
#[command(about = "Routes pillar API requests to registered handlers", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = startup::load(args.config.as_deref())?;
    startup::init_observability(&config.observability)?;

    tracing::info!("pillar-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        api_prefix = %config.gateway.api_prefix,
        request_timeout_secs = config.timeouts.request_secs,
        websocket = config.websocket.enabled,
        "Configuration loaded"
    );

    let registry = startup::build_registry(|_| Ok(()))?;
    let server = HttpServer::new(config.clone(), registry);

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    // Hot reload of route status overrides. The watcher must stay alive.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState {
            gateway: server.gateway(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = serve_admin(listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    match &config.listener.tls {
        Some(tls) => {
            let rustls = load_tls_config(tls).await?;
            let addr: SocketAddr = config.listener.bind_address.parse()?;
            server
                .run_tls(addr, rustls, config_updates, shutdown.subscribe())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server
                .run(listener, config_updates, shutdown.subscribe())
                .await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
