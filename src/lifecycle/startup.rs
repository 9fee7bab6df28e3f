//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order: config, logging, metrics, registry
//! - Listeners start last (traffic only when ready)

use std::path::Path;

use crate::config::schema::ObservabilityConfig;
use crate::config::validation::validate_config;
use crate::config::{load_config, ConfigError, GatewayConfig};
use crate::observability::{logging, metrics};
use crate::pillars;
use crate::routing::{HandlerRegistry, RegistryBuilder, RegistryError};

/// Load the config file, or validated defaults when no path is given.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = GatewayConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Install logging and, when enabled, the Prometheus exporter.
pub fn init_observability(config: &ObservabilityConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(config);

    if config.metrics_enabled {
        let addr = config.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }
    Ok(())
}

/// Freeze the registry. `register` adds business routes; built-in pillar
/// endpoints are added after it so their route counts are complete.
pub fn build_registry<F>(register: F) -> Result<HandlerRegistry, RegistryError>
where
    F: FnOnce(&mut RegistryBuilder) -> Result<(), RegistryError>,
{
    let mut builder = RegistryBuilder::new();
    register(&mut builder)?;
    pillars::install(&mut builder)?;
    let registry = builder.build();

    tracing::info!(
        routes = registry.len(),
        pillars = registry.pillars().len(),
        "Handler registry frozen"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::HandlerRequest;
    use crate::routing::{Pillar, RouteSpec};
    use serde_json::json;

    #[test]
    fn test_load_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.gateway.api_prefix, "/api");
    }

    #[test]
    fn test_build_registry_adds_health_routes() {
        let registry = build_registry(|b| {
            b.register(RouteSpec::get(
                Pillar::Session,
                "create",
                |_req: HandlerRequest| async move { Ok(json!({})) },
            ))?;
            Ok(())
        })
        .unwrap();
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_duplicate_business_route_fails_startup() {
        let result = build_registry(|b| {
            b.register(RouteSpec::get(
                Pillar::Session,
                "health",
                |_req: HandlerRequest| async move { Ok(json!({})) },
            ))?;
            Ok(())
        });
        assert!(matches!(result, Err(RegistryError::Duplicate(_))));
    }
}
