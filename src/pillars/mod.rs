//! Built-in pillar endpoints.
//!
//! Business handlers are registered by the services that own them; the
//! gateway itself only contributes `GET {pillar}/health` per pillar.

use serde_json::json;

use crate::gateway::HandlerRequest;
use crate::routing::{Pillar, RegistryBuilder, RegistryError, RouteSpec};

pub const HEALTH_PATH: &str = "health";

/// Register the health endpoint of every pillar. Call after all business
/// routes so the reported route counts are complete.
pub fn install(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    for pillar in Pillar::ALL {
        let routes = builder.count_for(pillar) + 1;
        builder.register(
            RouteSpec::get(pillar, HEALTH_PATH, move |_req: HandlerRequest| async move {
                Ok(json!({
                    "pillar": pillar,
                    "status": "healthy",
                    "routes": routes,
                }))
            })
            .describe(format!("Liveness of the {} pillar", pillar))
            .tag("builtin"),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::gateway::{Gateway, GatewayRequest};
    use crate::routing::ApiMethod;

    #[tokio::test]
    async fn test_health_reports_route_count() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(RouteSpec::post(
                Pillar::Content,
                "upload-file",
                |_req: HandlerRequest| async move { Ok(json!({})) },
            ))
            .unwrap();
        install(&mut builder).unwrap();

        let registry = builder.build();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.pillars().len(), 5);

        let gateway = Gateway::new(registry, &RoutingConfig::default());
        let resp = gateway
            .route(GatewayRequest::new("/api/content/health", ApiMethod::Get))
            .await;
        assert_eq!(
            resp.envelope.data,
            Some(json!({"pillar": "content", "status": "healthy", "routes": 2}))
        );

        let resp = gateway
            .route(GatewayRequest::new(
                "/api/business_outcomes_pillar/health",
                ApiMethod::Get,
            ))
            .await;
        assert_eq!(resp.envelope.data.unwrap()["routes"], json!(1));
    }

    #[test]
    fn test_install_twice_fails() {
        let mut builder = RegistryBuilder::new();
        install(&mut builder).unwrap();
        assert!(matches!(
            install(&mut builder),
            Err(RegistryError::Duplicate(_))
        ));
    }
}
