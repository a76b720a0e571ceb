//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! A `.env` file in the working directory is read first when present.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use cpr_core::{BranchMatch, ReportPolicy};

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// Listen address
    pub bind_address: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Branch matching for tickets and guarantees
    pub policy: ReportPolicy,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ReportPolicy::default();

        let config = ApiConfig {
            port: lookup("PORT")
                .unwrap_or_else(|| "3002".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),

            database_path: lookup("DATABASE_PATH")
                .unwrap_or_else(|| "./data/cpr.db".to_string())
                .into(),

            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            policy: ReportPolicy {
                tickets: match lookup("TICKET_BRANCH_MATCH") {
                    Some(raw) => raw
                        .parse::<BranchMatch>()
                        .map_err(|_| ConfigError::InvalidValue("TICKET_BRANCH_MATCH".to_string()))?,
                    None => defaults.tickets,
                },
                guarantees: match lookup("GUARANTEE_BRANCH_MATCH") {
                    Some(raw) => raw
                        .parse::<BranchMatch>()
                        .map_err(|_| ConfigError::InvalidValue("GUARANTEE_BRANCH_MATCH".to_string()))?,
                    None => defaults.guarantees,
                },
            },
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Socket address to listen on.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("BIND_ADDRESS".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
