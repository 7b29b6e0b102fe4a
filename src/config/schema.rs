//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::duration::parse_duration;

/// Fallback for `shutdown_duration`.
pub const DEFAULT_SHUTDOWN_DURATION: Duration = Duration::from_secs(5);

/// Fallback for `probe_wait_time`.
pub const DEFAULT_PROBE_WAIT_TIME: Duration = Duration::from_secs(3);

/// Fallback for `timeout`.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Configuration file version, must match [`crate::config::CURRENT_VERSION`].
    pub version: String,

    /// Listener and health check settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: crate::config::CURRENT_VERSION.to_string(),
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration shared by the API, RPC, bridged and health check listeners.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address every listener binds to.
    pub address: String,

    /// RPC listener port.
    pub grpc_port: u16,

    /// Bridged (browser-facing RPC) listener port.
    pub grpc_web_port: u16,

    /// REST API listener port.
    pub http_port: u16,

    /// Health check listener port.
    pub health_check_port: u16,

    /// Path served by the health check listener. Empty disables the listener.
    pub health_check_path: String,

    /// Per-request timeout for the REST API (e.g. "30s").
    pub timeout: String,

    /// Upper bound for a single listener's graceful stop (e.g. "5s").
    pub shutdown_duration: String,

    /// Delay before stopping non health check listeners (e.g. "3s").
    pub probe_wait_time: String,

    /// TLS settings for the API, RPC and bridged listeners.
    pub tls: TlsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            grpc_port: 8083,
            grpc_web_port: 8082,
            http_port: 8081,
            health_check_port: 8080,
            health_check_path: "/healthz".to_string(),
            timeout: "30s".to_string(),
            shutdown_duration: "5s".to_string(),
            probe_wait_time: "3s".to_string(),
            tls: TlsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Effective shutdown bound, 5s when absent or unparsable.
    pub fn shutdown_duration(&self) -> Duration {
        duration_or("shutdown_duration", &self.shutdown_duration, DEFAULT_SHUTDOWN_DURATION)
    }

    /// Effective probe wait, 3s when absent or unparsable.
    pub fn probe_wait_time(&self) -> Duration {
        duration_or("probe_wait_time", &self.probe_wait_time, DEFAULT_PROBE_WAIT_TIME)
    }

    /// Effective request timeout, 30s when absent or unparsable.
    pub fn request_timeout(&self) -> Duration {
        duration_or("timeout", &self.timeout, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Bind IP, all interfaces when the configured address is not an IP.
    pub fn ip(&self) -> IpAddr {
        self.address
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }

    pub fn api_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip(), self.http_port)
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip(), self.grpc_port)
    }

    pub fn bridge_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip(), self.grpc_web_port)
    }

    pub fn health_check_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip(), self.health_check_port)
    }
}

fn duration_or(field: &str, raw: &str, default: Duration) -> Duration {
    match parse_duration(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                field,
                value = raw,
                error = %e,
                default = ?default,
                "Invalid duration, using default"
            );
            default
        }
    }
}

/// TLS configuration.
///
/// The keys are names of environment variables holding the actual file
/// paths, not the paths themselves.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Serve the API, RPC and bridged listeners over TLS.
    pub enabled: bool,

    /// Environment variable holding the certificate chain path.
    pub cert_key: String,

    /// Environment variable holding the private key path.
    pub key_key: String,

    /// Environment variable holding the client CA path. Enables mutual TLS when set.
    pub ca_key: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cert_key: String::new(),
            key_key: String::new(),
            ca_key: String::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_fall_back_to_defaults() {
        let cfg = ServerConfig {
            shutdown_duration: "soon".into(),
            probe_wait_time: String::new(),
            timeout: "-1s".into(),
            ..ServerConfig::default()
        };
        assert_eq!(cfg.shutdown_duration(), Duration::from_secs(5));
        assert_eq!(cfg.probe_wait_time(), Duration::from_secs(3));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn durations_parse_configured_values() {
        let cfg = ServerConfig {
            shutdown_duration: "1m30s".into(),
            probe_wait_time: "250ms".into(),
            ..ServerConfig::default()
        };
        assert_eq!(cfg.shutdown_duration(), Duration::from_secs(90));
        assert_eq!(cfg.probe_wait_time(), Duration::from_millis(250));
    }

    #[test]
    fn addresses_derive_from_ports() {
        let cfg = ServerConfig {
            address: "127.0.0.1".into(),
            http_port: 8081,
            health_check_port: 8080,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.api_addr().to_string(), "127.0.0.1:8081");
        assert_eq!(cfg.health_check_addr().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let cfg: Config = toml::from_str("[server]\nhttp_port = 9000\n").unwrap();
        assert_eq!(cfg.version, crate::config::CURRENT_VERSION);
        assert_eq!(cfg.server.http_port, 9000);
        assert_eq!(cfg.server.health_check_path, "/healthz");
        assert!(cfg.server.tls.enabled);
    }
}
