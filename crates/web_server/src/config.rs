//! Server configuration read from environment variables.

use std::str::FromStr;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATABASE_URL: &str = "postgres://localhost/campground_bookings";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_JWT_EXPIRE_DAYS: i64 = 30;

/// Errors raised while reading the configuration
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("{name} has an invalid value: {value}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// The rejected value
        value: String,
    },
}

/// Runtime settings for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// PostgreSQL connection string
    pub database_url: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// HMAC secret used to sign tokens
    pub jwt_secret: String,
    /// Token lifetime in days
    pub jwt_expire_days: i64,
    /// Whether the server runs in production mode
    pub production: bool,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expire_days = parse_or(&lookup, "JWT_EXPIRE_DAYS", DEFAULT_JWT_EXPIRE_DAYS)?;
        if jwt_expire_days <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRE_DAYS",
                value: jwt_expire_days.to_string(),
            });
        }

        let production = lookup("APP_ENV")
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            jwt_secret,
            jwt_expire_days,
            production,
            run_migrations: parse_flag(&lookup, "RUN_MIGRATIONS", true)?,
        })
    }

    /// The `host:port` pair to bind.
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("JWT_SECRET", "secret")]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.jwt_expire_days, 30);
        assert!(!config.production);
        assert!(config.run_migrations);
    }

    #[test]
    fn test_jwt_secret_is_required() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("JWT_SECRET"));
        assert_eq!(
            config(&[("JWT_SECRET", "")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("JWT_SECRET", "secret"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("JWT_EXPIRE_DAYS", "7"),
            ("APP_ENV", "Production"),
            ("RUN_MIGRATIONS", "false"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), ("127.0.0.1".to_string(), 8080));
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.jwt_expire_days, 7);
        assert!(config.production);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = config(&[("JWT_SECRET", "secret"), ("PORT", "http")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "http".to_string()
            }
        );

        let err = config(&[("JWT_SECRET", "secret"), ("JWT_EXPIRE_DAYS", "0")]).unwrap_err();
        assert!(err.to_string().contains("JWT_EXPIRE_DAYS"));

        assert!(config(&[("JWT_SECRET", "secret"), ("RUN_MIGRATIONS", "maybe")]).is_err());
    }
}
