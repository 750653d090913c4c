//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use lol_tournament::db::DatabaseConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default HTTP bind address
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5000);

/// Front-end files shipped with the crate
pub const DEFAULT_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Where entities are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL through the connection pool
    Postgres,
    /// Process-local store, lost on exit
    Memory,
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Storage backend
    pub storage: StorageBackend,
    /// Database configuration, used with [`StorageBackend::Postgres`]
    pub database: DatabaseConfig,
    /// Apply migrations on startup
    pub run_migrations: bool,
    /// Directory served at `/`, if any
    pub static_dir: Option<PathBuf>,
    /// Prometheus exporter bind address, if metrics are enabled
    pub metrics_bind: Option<SocketAddr>,
}

/// Values given on the command line; they win over the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub in_memory: bool,
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a set variable cannot be parsed where silently
    /// falling back would hide a typo (`SERVER_BIND`, `METRICS_BIND`).
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_addr_env("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        let storage = if overrides.in_memory || parse_env_or("IN_MEMORY", false) {
            StorageBackend::Memory
        } else {
            StorageBackend::Postgres
        };

        let database_url = overrides
            .database_url
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| DatabaseConfig::DEVELOPMENT_URL.to_string());

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", 20),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", 2),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT_SECS", 5),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", 1800),
        };

        // An empty STATIC_DIR disables the front end
        let static_dir = match overrides.static_dir {
            Some(dir) => Some(dir),
            None => match std::env::var("STATIC_DIR") {
                Ok(dir) if dir.trim().is_empty() => None,
                Ok(dir) => Some(PathBuf::from(dir)),
                Err(_) => Some(PathBuf::from(DEFAULT_STATIC_DIR)),
            },
        };

        Ok(ServerConfig {
            bind,
            storage,
            database,
            run_migrations: parse_env_or("RUN_MIGRATIONS", true),
            static_dir,
            metrics_bind: parse_addr_env("METRICS_BIND")?,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage == StorageBackend::Postgres {
            if self.database.database_url.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    var: "DATABASE_URL".to_string(),
                    hint: "Set DATABASE_URL or start with --in-memory".to_string(),
                });
            }

            if self.database.max_connections == 0 {
                return Err(ConfigError::Invalid {
                    var: "DB_MAX_CONNECTIONS".to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }

            if self.database.min_connections > self.database.max_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MIN_CONNECTIONS".to_string(),
                    reason: format!(
                        "Cannot exceed max connections ({})",
                        self.database.max_connections
                    ),
                });
            }

            if self.database.connection_timeout_secs == 0 {
                return Err(ConfigError::Invalid {
                    var: "DB_CONNECTION_TIMEOUT_SECS".to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an optional socket address variable, rejecting malformed values
fn parse_addr_env(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::Invalid {
                    var: key.to_string(),
                    reason: format!("{value:?} is not a socket address: {e}"),
                })
        }
        _ => Ok(None),
    }
}
