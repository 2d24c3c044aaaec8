//! Database configuration module.

use std::env;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    ///
    /// Returns `None` when `DATABASE_URL` isn't set, in which case callers
    /// fall back to the in-memory ledger. Unparseable numbers use defaults.
    pub fn from_env() -> Option<Self> {
        let database_url = env::var("DATABASE_URL").ok()?;
        Some(Self {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", 1),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT", 10),
        })
    }

    /// Local development database.
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/chatpoker".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 10,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
