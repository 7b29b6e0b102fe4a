//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the configuration version
//! - Validate the bind address and health check path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>
//! - Malformed durations are not errors; they fall back to defaults at use

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::Config;
use crate::config::CURRENT_VERSION;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid configuration version {found:?}, expected {expected:?}")]
    Version { found: String, expected: &'static str },

    #[error("invalid bind address {0:?}")]
    Address(String),

    #[error("health check path {0:?} must start with '/'")]
    HealthCheckPath(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.version != CURRENT_VERSION {
        errors.push(ValidationError::Version {
            found: config.version.clone(),
            expected: CURRENT_VERSION,
        });
    }

    let server = &config.server;
    if server.address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::Address(server.address.clone()));
    }

    let path = &server.health_check_path;
    if !path.is_empty() && !path.starts_with('/') {
        errors.push(ValidationError::HealthCheckPath(path.clone()));
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
    fn default_config_is_valid() {
        assert_eq!(validate_config(&Config::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = Config::default();
        config.version = "v0.9.0".into();
        config.server.address = "localhost".into();
        config.server.health_check_path = "healthz".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ValidationError::Version { .. }));
        assert_eq!(errors[1], ValidationError::Address("localhost".into()));
        assert_eq!(errors[2], ValidationError::HealthCheckPath("healthz".into()));
    }

    #[test]
    fn empty_health_path_disables_rather_than_fails() {
        let mut config = Config::default();
        config.server.health_check_path.clear();
        assert_eq!(validate_config(&config), Ok(()));
    }
}
