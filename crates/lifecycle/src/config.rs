//! Controller configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use auction_types::Amount;

/// Balance moved from the funding payer into each new auction account.
pub const DEFAULT_INITIAL_AUCTION_BALANCE: Amount = 1_000_000_000;

/// Configuration for the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Funds transferred into each auction at deployment
    pub initial_auction_balance: Amount,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            initial_auction_balance: DEFAULT_INITIAL_AUCTION_BALANCE,
        }
    }
}

impl ControllerConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Errors loading the controller configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert_eq!(config.initial_auction_balance, 1_000_000_000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ControllerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ControllerConfig::default());

        let config: ControllerConfig =
            serde_json::from_str(r#"{"initial_auction_balance": 5}"#).unwrap();
        assert_eq!(config.initial_auction_balance, 5);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "auction-controller-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"initial_auction_balance": 1234}"#).unwrap();

        let config = ControllerConfig::load(&path).unwrap();
        assert_eq!(config.initial_auction_balance, 1234);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let result = ControllerConfig::load(Path::new("/nonexistent/auction-config.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
