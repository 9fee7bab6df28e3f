//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0, addresses parse)
//! - Check route overrides name a real pillar and method
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::routing::{ApiMethod, Pillar};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    let prefix = &config.gateway.api_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "gateway.api_prefix",
            format!("'{}' must start with '/', not end with '/' and not be '/'", prefix),
        ));
    }
    if config.gateway.api_version.trim().is_empty() {
        errors.push(ValidationError::new("gateway.api_version", "must not be empty"));
    }

    for (i, o) in config.gateway.route_overrides.iter().enumerate() {
        if o.pillar.parse::<Pillar>().is_err() {
            errors.push(ValidationError::new(
                format!("gateway.route_overrides[{}].pillar", i),
                format!("unknown pillar '{}'", o.pillar),
            ));
        }
        if o.method.parse::<ApiMethod>().is_err() {
            errors.push(ValidationError::new(
                format!("gateway.route_overrides[{}].method", i),
                format!("unknown method '{}'", o.method),
            ));
        }
        if o.path.is_empty() {
            errors.push(ValidationError::new(
                format!("gateway.route_overrides[{}].path", i),
                "must not be empty",
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    if config.websocket.enabled {
        if !config.websocket.path.starts_with('/') {
            errors.push(ValidationError::new("websocket.path", "must start with '/'"));
        }
        if config.websocket.max_message_size == 0 {
            errors.push(ValidationError::new(
                "websocket.max_message_size",
                "must be greater than 0",
            ));
        }
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new(
                "admin.api_key",
                "must be set when the admin API is enabled",
            ));
        }
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            field,
            format!("'{}' is not a valid socket address", value),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteOverride;
    use crate::routing::RouteStatus;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_prefix_rules() {
        for bad in ["api", "/", "/api/", ""] {
            let mut config = GatewayConfig::default();
            config.gateway.api_prefix = bad.to_string();
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors[0].field, "gateway.api_prefix", "{}", bad);
        }

        let mut config = GatewayConfig::default();
        config.gateway.api_prefix = "/api/v1".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_admin_requires_key() {
        let mut config = GatewayConfig::default();
        config.admin.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "admin.api_key");
    }

    #[test]
    fn test_bad_override_and_address_collected() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".to_string();
        config.gateway.route_overrides.push(RouteOverride {
            pillar: "billing".into(),
            path: "x".into(),
            method: "TRACE".into(),
            status: RouteStatus::Maintenance,
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "gateway.route_overrides[0].pillar",
                "gateway.route_overrides[0].method",
            ]
        );
    }
}
