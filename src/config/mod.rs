use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Base secret used in development when `BOOKS_JWT_SECRET` is unset.
/// The effective signing secret is always derived from this plus the magic keys.
const DEVELOPMENT_SECRET: &str = "super-secret-change-this";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Failed to read magic keys from {path}: {source}")]
    KeysUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed magic keys file {path}: {source}")]
    KeysMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub backup_on_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub magic_keys_path: PathBuf,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source so tests never touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        };

        let defaults = match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        };

        let config = defaults.with_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("BOOKS_API_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("BOOKS_API_PORT").or_else(|| lookup("PORT")) {
            self.server.port = parse_value("BOOKS_API_PORT", &v)?;
        }

        // Database overrides
        if let Some(v) = lookup("BOOKS_DB_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("BOOKS_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_value("BOOKS_DB_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("BOOKS_DB_BACKUP_ON_OPEN") {
            self.database.backup_on_open = parse_value("BOOKS_DB_BACKUP_ON_OPEN", &v)?;
        }

        // API overrides
        if let Some(v) = lookup("BOOKS_REQUEST_LOGGING") {
            self.api.enable_request_logging = parse_value("BOOKS_REQUEST_LOGGING", &v)?;
        }
        if let Some(v) = lookup("BOOKS_MAX_REQUEST_BYTES") {
            self.api.max_request_size_bytes = parse_value("BOOKS_MAX_REQUEST_BYTES", &v)?;
        }

        // Security overrides
        if let Some(v) = lookup("BOOKS_MAGIC_KEYS") {
            self.security.magic_keys_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("BOOKS_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("BOOKS_TOKEN_TTL_DAYS") {
            self.security.token_ttl_days = parse_value("BOOKS_TOKEN_TTL_DAYS", &v)?;
        }

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("BOOKS_JWT_SECRET"));
        }
        let expiry_fits = chrono::Duration::try_days(self.security.token_ttl_days)
            .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
            .is_some();
        if self.security.token_ttl_days <= 0 || !expiry_fits {
            return Err(ConfigError::InvalidValue {
                key: "BOOKS_TOKEN_TTL_DAYS",
                value: self.security.token_ttl_days.to_string(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BOOKS_DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.server.host, self.server.port);
        raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "BOOKS_API_HOST",
            value: raw,
        })
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8181,
            },
            database: DatabaseConfig {
                path: PathBuf::from("books.db"),
                max_connections: 5,
                backup_on_open: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                magic_keys_path: PathBuf::from("magic-keys.json"),
                jwt_secret: DEVELOPMENT_SECRET.to_string(),
                token_ttl_days: 14,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8181,
            },
            database: DatabaseConfig {
                path: PathBuf::from("books.db"),
                max_connections: 10,
                backup_on_open: true,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                magic_keys_path: PathBuf::from("magic-keys.json"),
                // Must come from BOOKS_JWT_SECRET
                jwt_secret: String::new(),
                token_ttl_days: 14,
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
