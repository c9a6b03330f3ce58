//! Engine configuration

use serde::{Deserialize, Serialize};
use types::errors::EngineError;

/// Configuration for the matching engine and the exchange around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Id handed to the first accepted order (must be > 0).
    pub first_order_id: u64,
    /// Abort an operation that would cross a trader against their own order.
    pub prevent_self_trade: bool,
    /// Cap on orders a trader may have resting in one book.
    pub max_open_orders_per_trader: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            first_order_id: 1,
            prevent_self_trade: false,
            max_open_orders_per_trader: None,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| EngineError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.first_order_id == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "first_order_id must be greater than zero".to_string(),
            });
        }
        if self.max_open_orders_per_trader == Some(0) {
            return Err(EngineError::InvalidConfig {
                reason: "max_open_orders_per_trader must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.first_order_id, 1);
        assert!(!config.prevent_self_trade);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{"prevent_self_trade": true}"#).unwrap();
        assert!(config.prevent_self_trade);
        assert_eq!(config.first_order_id, 1);
        assert_eq!(config.max_open_orders_per_trader, None);
    }

    #[test]
    fn test_from_json_rejects_zero_first_id() {
        let err = EngineConfig::from_json(r#"{"first_order_id": 0}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { .. }));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(EngineConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_zero_open_order_cap_rejected() {
        let config = EngineConfig {
            max_open_orders_per_trader: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
