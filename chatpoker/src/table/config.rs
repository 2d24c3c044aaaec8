//! Session configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::GameSettings;

/// Configuration for one session actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Display name, used in logs
    pub name: String,

    /// Blinds, seat limits, buy-in range, timeouts and rake
    pub settings: GameSettings,

    /// Play hand after hand with stacks carried over instead of paying out
    /// and closing after the first one
    pub continuous: bool,

    /// Deal as soon as enough players are seated
    pub auto_start: bool,

    /// Bounded inbox size (default: 100)
    pub inbox_capacity: usize,

    /// Upper bound on a single ledger call
    pub ledger_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "Hold'em".to_string(),
            settings: GameSettings::default(),
            continuous: false,
            auto_start: false,
            inbox_capacity: 100,
            ledger_timeout_ms: 5_000,
        }
    }
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.settings.validate()?;

        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be greater than 0".to_string());
        }

        if self.ledger_timeout_ms == 0 {
            return Err("Ledger timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_inbox() {
        let config = SessionConfig {
            inbox_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_blinds() {
        let mut config = SessionConfig::default();
        config.settings.big_blind = 1;
        config.settings.small_blind = 2;
        assert!(config.validate().is_err());
    }
}
