//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use chatpoker::{
    SessionConfig,
    constants::MAX_PLAYERS,
    db::DatabaseConfig,
    game::{Chips, GameSettings},
};
use std::time::Duration;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Ledger database, or `None` to keep wallets in memory
    pub database: Option<DatabaseConfig>,
    /// Defaults for every session opened from the console
    pub session_defaults: SessionDefaultsConfig,
    /// How often the timeout sweeper ticks every session
    pub sweep_interval_ms: u64,
    /// Balance a wallet starts with the first time it's seen
    pub default_wallet_balance: i64,
}

/// Default session configuration
#[derive(Debug, Clone)]
pub struct SessionDefaultsConfig {
    /// Small blind amount
    pub small_blind: Chips,
    /// Big blind amount
    pub big_blind: Chips,
    /// Players needed to deal
    pub min_players: usize,
    /// Maximum players per session
    pub max_players: usize,
    /// Minimum buy-in (in big blinds)
    pub min_buy_in_bb: u32,
    /// Maximum buy-in (in big blinds)
    pub max_buy_in_bb: u32,
    /// Seconds a player has to act
    pub action_timeout_secs: u64,
    /// Timeouts in a row before a player is folded
    pub max_timeout_strikes: u8,
    /// House rake in basis points
    pub rake_bps: u32,
    /// Largest rake taken from one pot
    pub rake_cap: Option<Chips>,
    /// Keep dealing hands until players leave
    pub continuous: bool,
    /// Deal automatically once enough players sit
    pub auto_start: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `continuous_override` - Force continuous sessions (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a set variable fails to parse
    pub fn from_env(
        database_url_override: Option<String>,
        continuous_override: bool,
    ) -> Result<Self, ConfigError> {
        let database = match database_url_override {
            Some(database_url) => Some(DatabaseConfig {
                database_url,
                ..DatabaseConfig::from_env().unwrap_or_default()
            }),
            None => DatabaseConfig::from_env(),
        };

        let rake_cap = match std::env::var("SESSION_RAKE_CAP") {
            Ok(v) => Some(v.parse().map_err(|_| ConfigError::Invalid {
                var: "SESSION_RAKE_CAP".to_string(),
                reason: format!("'{v}' is not a chip amount"),
            })?),
            Err(_) => None,
        };

        let session_defaults = SessionDefaultsConfig {
            small_blind: parse_env_or("SESSION_SMALL_BLIND", 10),
            big_blind: parse_env_or("SESSION_BIG_BLIND", 20),
            min_players: parse_env_or("SESSION_MIN_PLAYERS", 2),
            max_players: parse_env_or("SESSION_MAX_PLAYERS", 9),
            min_buy_in_bb: parse_env_or("SESSION_MIN_BUY_IN_BB", 20),
            max_buy_in_bb: parse_env_or("SESSION_MAX_BUY_IN_BB", 200),
            action_timeout_secs: parse_env_or("SESSION_ACTION_TIMEOUT_SECS", 30),
            max_timeout_strikes: parse_env_or("SESSION_MAX_TIMEOUT_STRIKES", 3),
            rake_bps: parse_env_or("SESSION_RAKE_BPS", 0),
            rake_cap,
            continuous: continuous_override || parse_env_or("SESSION_CONTINUOUS", false),
            auto_start: parse_env_or("SESSION_AUTO_START", false),
        };

        Ok(ServerConfig {
            database,
            session_defaults,
            sweep_interval_ms: parse_env_or("SWEEP_INTERVAL_MS", 1_000),
            default_wallet_balance: parse_env_or("DEFAULT_WALLET_BALANCE", 10_000),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let defaults = &self.session_defaults;

        // Validate blinds
        if defaults.small_blind == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_SMALL_BLIND".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if defaults.big_blind < defaults.small_blind {
            return Err(ConfigError::Invalid {
                var: "SESSION_BIG_BLIND".to_string(),
                reason: format!(
                    "Must be at least the small blind ({})",
                    defaults.small_blind
                ),
            });
        }

        // Validate buy-ins
        if defaults.min_buy_in_bb == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_MIN_BUY_IN_BB".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if defaults.max_buy_in_bb < defaults.min_buy_in_bb {
            return Err(ConfigError::Invalid {
                var: "SESSION_MAX_BUY_IN_BB".to_string(),
                reason: format!(
                    "Must be at least the min buy-in ({})",
                    defaults.min_buy_in_bb
                ),
            });
        }

        // Validate player count
        if defaults.min_players < 2 || defaults.min_players > defaults.max_players {
            return Err(ConfigError::Invalid {
                var: "SESSION_MIN_PLAYERS".to_string(),
                reason: format!("Must be between 2 and {}", defaults.max_players),
            });
        }

        if defaults.max_players > MAX_PLAYERS {
            return Err(ConfigError::Invalid {
                var: "SESSION_MAX_PLAYERS".to_string(),
                reason: format!("Must be at most {MAX_PLAYERS} (max players with 52-card deck)"),
            });
        }

        if defaults.action_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_ACTION_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if defaults.rake_bps > 10_000 {
            return Err(ConfigError::Invalid {
                var: "SESSION_RAKE_BPS".to_string(),
                reason: "Must be at most 10000 (the whole pot)".to_string(),
            });
        }

        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "SWEEP_INTERVAL_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.default_wallet_balance < 0 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_WALLET_BALANCE".to_string(),
                reason: "Must not be negative".to_string(),
            });
        }

        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Session config for a new console session.
    pub fn session_config(&self, name: &str) -> SessionConfig {
        let defaults = &self.session_defaults;
        SessionConfig {
            name: name.to_string(),
            settings: GameSettings {
                small_blind: defaults.small_blind,
                big_blind: defaults.big_blind,
                min_players: defaults.min_players,
                max_players: defaults.max_players,
                min_buy_in: defaults.big_blind.saturating_mul(defaults.min_buy_in_bb),
                max_buy_in: defaults.big_blind.saturating_mul(defaults.max_buy_in_bb),
                action_timeout: Duration::from_secs(defaults.action_timeout_secs),
                max_timeout_strikes: defaults.max_timeout_strikes,
                rake_bps: defaults.rake_bps,
                rake_cap: defaults.rake_cap,
            },
            continuous: defaults.continuous,
            auto_start: defaults.auto_start,
            ..SessionConfig::default()
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            database: None,
            session_defaults: SessionDefaultsConfig {
                small_blind: 10,
                big_blind: 20,
                min_players: 2,
                max_players: 9,
                min_buy_in_bb: 20,
                max_buy_in_bb: 200,
                action_timeout_secs: 30,
                max_timeout_strikes: 3,
                rake_bps: 500,
                rake_cap: Some(60),
                continuous: false,
                auto_start: false,
            },
            sweep_interval_ms: 1_000,
            default_wallet_balance: 10_000,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "SESSION_RAKE_BPS".to_string(),
            reason: "Too big".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SESSION_RAKE_BPS"));
        assert!(msg.contains("Too big"));
    }

    #[test]
    fn test_valid_config_builds_valid_session_config() {
        let config = valid_config();
        assert!(config.validate().is_ok());

        let session = config.session_config("Friday game");
        assert_eq!(session.name, "Friday game");
        assert_eq!(session.settings.min_buy_in, 400);
        assert_eq!(session.settings.max_buy_in, 4_000);
        assert_eq!(session.settings.rake_cap, Some(60));
        assert!(session.validate().is_ok());
    }

    #[test]
    fn test_config_validation_blind_zero() {
        let mut config = valid_config();
        config.session_defaults.small_blind = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == "SESSION_SMALL_BLIND"));
    }

    #[test]
    fn test_config_validation_big_blind_too_small() {
        let mut config = valid_config();
        config.session_defaults.small_blind = 20;
        config.session_defaults.big_blind = 10;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == "SESSION_BIG_BLIND"));
    }

    #[test]
    fn test_config_validation_too_many_players() {
        let mut config = valid_config();
        config.session_defaults.max_players = MAX_PLAYERS + 1;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rake_over_pot() {
        let mut config = valid_config();
        config.session_defaults.rake_bps = 10_001;

        assert!(config.validate().is_err());
    }
}
