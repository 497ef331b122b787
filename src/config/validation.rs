//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ceilings > 0)
//! - Check addresses, the relay prefix and the outbound user agent
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::schema::RelayConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single rejected configuration field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }

    let prefix = &config.relay.prefix;
    if !prefix.starts_with('/') || !prefix.ends_with('/') || prefix.len() < 3 {
        errors.push(ValidationError::new(
            "relay.prefix",
            format!("`{}` must look like `/name/`", prefix),
        ));
    } else if prefix.contains(['{', '}', '*', '?', '#']) {
        errors.push(ValidationError::new(
            "relay.prefix",
            "must not contain route or URL metacharacters",
        ));
    }
    if config.relay.inactivity_timeout_secs == 0 {
        errors.push(ValidationError::new("relay.inactivity_timeout_secs", "must be greater than 0"));
    }
    if config.relay.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("relay.connect_timeout_secs", "must be greater than 0"));
    }
    if HeaderValue::from_str(&config.relay.user_agent).is_err() {
        errors.push(ValidationError::new("relay.user_agent", "is not a valid header value"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("`{}` is not one of {}", config.observability.log_level, LOG_LEVELS.join(", ")),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&RelayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.listener.max_connections = 0;
        config.relay.inactivity_timeout_secs = 0;
        config.relay.prefix = "proxy".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "listener.max_connections",
                "relay.prefix",
                "relay.inactivity_timeout_secs",
            ]
        );
    }

    #[test]
    fn prefix_shapes() {
        for bad in ["/", "//", "/proxy", "proxy/", "/{x}/", "/a*/"] {
            let mut config = RelayConfig::default();
            config.relay.prefix = bad.into();
            assert!(validate_config(&config).is_err(), "{bad} should be rejected");
        }
        for good in ["/proxy/", "/r/", "/api/relay/"] {
            let mut config = RelayConfig::default();
            config.relay.prefix = good.into();
            assert!(validate_config(&config).is_ok(), "{good} should be accepted");
        }
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = RelayConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }

    #[test]
    fn unknown_log_level() {
        let mut config = RelayConfig::default();
        config.observability.log_level = "loud".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.log_level");
    }
}
