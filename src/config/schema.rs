//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a missing file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, in-flight ceiling).
    pub listener: ListenerConfig,

    /// Relay behaviour (prefix, timeouts, outbound identity).
    pub relay: RelaySettings,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Response hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum concurrent relay operations; excess requests get 503.
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Relay engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Path prefix in front of the target URL. Must start and end with `/`.
    pub prefix: String,

    /// Seconds without outbound progress before the relay is aborted.
    pub inactivity_timeout_secs: u64,

    /// Outbound connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// `User-Agent` sent to targets.
    pub user_agent: String,

    /// Skip certificate-chain and hostname verification for HTTPS targets.
    ///
    /// WARNING: on by default. Any target certificate is trusted.
    pub accept_invalid_certs: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            prefix: "/proxy/".to_string(),
            inactivity_timeout_secs: 30,
            connect_timeout_secs: 30,
            user_agent: "Web-Proxy-Server/1.0".to_string(),
            accept_invalid_certs: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add security headers to the relay's own responses.
    pub enable_headers: bool,
    /// Answer CORS preflights and allow any origin.
    pub enable_cors: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            enable_cors: true,
        }
    }
}
