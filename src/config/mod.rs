use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::auth::SharedSecret;

/// Request body ceiling for the data handler. Photos and materials arrive as
/// base64 data URLs inside the JSON body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Errors raised while assembling configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string; only required when the data handler runs against Postgres
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub shared_secret: SharedSecret,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let secret = lookup("CLASS_SITE_PASSWORD")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("CLASS_SITE_PASSWORD"))?;

        // Set defaults based on environment, then override with specific env vars
        let defaults = match environment {
            Environment::Production => Self::production(secret),
            Environment::Staging => Self::staging(secret),
            Environment::Development => Self::development(secret),
        };

        defaults.with_overrides(&lookup)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("CLASS_SITE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("CLASS_SITE_PORT").or_else(|| lookup("PORT")) {
            self.server.port = parse("CLASS_SITE_PORT", v)?;
        }
        if let Some(v) = lookup("CLASS_SITE_MAX_BODY_BYTES") {
            self.server.max_body_bytes = parse("CLASS_SITE_MAX_BODY_BYTES", v)?;
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL").filter(|s| !s.is_empty()) {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse("DATABASE_MAX_CONNECTIONS", v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse("DATABASE_CONNECTION_TIMEOUT", v)?;
        }
        if let Some(v) = lookup("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = parse("DATABASE_RUN_MIGRATIONS", v)?;
        }

        Ok(self)
    }

    fn development(secret: String) -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                shared_secret: SharedSecret::new(secret),
            },
        }
    }

    fn staging(secret: String) -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
                run_migrations: true,
            },
            security: SecurityConfig {
                shared_secret: SharedSecret::new(secret),
            },
        }
    }

    fn production(secret: String) -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
                run_migrations: false,
            },
            security: SecurityConfig {
                shared_secret: SharedSecret::new(secret),
            },
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::from_lookup(lookup(&[("CLASS_SITE_PASSWORD", "s3cret")])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server.port, 3000);
        assert!(config.database.run_migrations);
        assert!(config.database.url.is_none());
        assert!(config.security.shared_secret.matches("s3cret"));
        assert_eq!(config.server.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("CLASS_SITE_PASSWORD", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.database.run_migrations);
        assert_eq!(config.database.connection_timeout, 5);
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLASS_SITE_PASSWORD")));

        let err = AppConfig::from_lookup(lookup(&[("CLASS_SITE_PASSWORD", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLASS_SITE_PASSWORD")));
    }

    #[test]
    fn env_overrides_apply() {
        let config = AppConfig::from_lookup(lookup(&[
            ("CLASS_SITE_PASSWORD", "s3cret"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://u:p@db/class"),
            ("DATABASE_MAX_CONNECTIONS", "3"),
            ("DATABASE_RUN_MIGRATIONS", "false"),
            ("CLASS_SITE_MAX_BODY_BYTES", "1048576"),
        ]))
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_body_bytes, 1_048_576);
        assert_eq!(config.database.url.as_deref(), Some("postgres://u:p@db/class"));
        assert_eq!(config.database.max_connections, 3);
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("CLASS_SITE_PASSWORD", "s3cret"),
            ("CLASS_SITE_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CLASS_SITE_PORT", .. }));
    }
}
