//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::env::{actual_value, EnvLookup, ProcessEnv};
use crate::config::schema::Config;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Load and validate configuration from a TOML file, resolving `_NAME_`
/// placeholders against the process environment.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with(path, &ProcessEnv)
}

/// Same as [`load_config`] with an explicit environment.
pub fn load_config_with(path: &Path, env: &dyn EnvLookup) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;

    resolve_placeholders(&mut config, env);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Replace every `_NAME_` string value with the value of env var `NAME`.
pub fn resolve_placeholders(config: &mut Config, env: &dyn EnvLookup) {
    let server = &mut config.server;
    for field in [
        &mut server.address,
        &mut server.health_check_path,
        &mut server.timeout,
        &mut server.shutdown_duration,
        &mut server.probe_wait_time,
        &mut server.tls.cert_key,
        &mut server.tls.key_key,
        &mut server.tls.ca_key,
    ] {
        *field = actual_value(field, env);
    }
    config.observability.log_level = actual_value(&config.observability.log_level, env);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_full_config() {
        let file = write_config(
            r#"
version = "v1.0.0"

[server]
address = "127.0.0.1"
grpc_port = 9083
grpc_web_port = 9082
http_port = 9081
health_check_port = 9080
health_check_path = "/healthz"
timeout = "10s"
shutdown_duration = "_SHUTDOWN_"
probe_wait_time = "1s"

[server.tls]
enabled = true
cert_key = "SERVER_CERT"
key_key = "SERVER_KEY"
ca_key = ""
"#,
        );
        let env: HashMap<String, String> =
            [("SHUTDOWN".to_string(), "7s".to_string())].into_iter().collect();

        let config = load_config_with(file.path(), &env).unwrap();
        assert_eq!(config.server.http_port, 9081);
        assert_eq!(config.server.shutdown_duration, "7s");
        assert_eq!(config.server.tls.cert_key, "SERVER_CERT");
        assert_eq!(config.server.shutdown_duration().as_secs(), 7);
    }

    #[test]
    fn rejects_wrong_version() {
        let file = write_config("version = \"v2.0.0\"\n");
        let err = load_config_with(file.path(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("v2.0.0"));
    }

    #[test]
    fn reports_parse_and_io_errors() {
        let file = write_config("[server\n");
        assert!(matches!(
            load_config_with(file.path(), &HashMap::new()),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            load_config(Path::new("/nonexistent/serverd.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
