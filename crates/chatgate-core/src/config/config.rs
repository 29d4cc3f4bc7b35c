//! Top-level configuration

use super::{ChatConfig, LoggingConfig, ProviderConfig, RateLimitSettings, TierConfig};
use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};

/// Complete chatgate configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rate_limit: RateLimitSettings,
    pub chat: ChatConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> GatewayResult<()> {
        let tiers = [
            ("address", &self.rate_limit.address),
            ("identity", &self.rate_limit.identity),
            ("identity_route", &self.rate_limit.identity_route),
        ];
        for (name, tier) in tiers {
            validate_tier(name, tier)?;
        }

        if self.rate_limit.sweep_interval.is_zero() {
            return Err(GatewayError::config(
                "rate_limit.sweep_interval must be greater than zero",
            ));
        }

        for (route, route_override) in &self.rate_limit.routes {
            if route_override.custom_limit == Some(0) {
                return Err(GatewayError::config_with_context(
                    "customLimit must be greater than zero",
                    format!("rate_limit.routes.\"{}\"", route),
                ));
            }
            if route_override.custom_window.is_some_and(|w| w.is_zero()) {
                return Err(GatewayError::config_with_context(
                    "customWindow must be greater than zero",
                    format!("rate_limit.routes.\"{}\"", route),
                ));
            }
        }

        if self.provider.model.trim().is_empty() {
            return Err(GatewayError::config("provider.model must not be empty"));
        }
        if self.provider.max_tokens == 0 {
            return Err(GatewayError::config(
                "provider.max_tokens must be greater than zero",
            ));
        }

        if !LoggingConfig::LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(GatewayError::config(format!(
                "Invalid log level '{}'",
                self.logging.level
            )));
        }
        if !LoggingConfig::FORMATS.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(GatewayError::config(format!(
                "Invalid log format '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }
}

fn validate_tier(name: &str, tier: &TierConfig) -> GatewayResult<()> {
    if tier.max_requests == 0 {
        return Err(GatewayError::config(format!(
            "rate_limit.{}.max_requests must be greater than zero",
            name
        )));
    }
    if tier.window.is_zero() {
        return Err(GatewayError::config(format!(
            "rate_limit.{}.window must be greater than zero",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteOverride;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut config = Config::default();
        config.rate_limit.identity.max_requests = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("identity.max_requests"));
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = Config::default();
        config.rate_limit.address.window = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_custom_limit_rejected() {
        let mut config = Config::default();
        config.rate_limit = config.rate_limit.with_route(
            "POST /chats",
            RouteOverride {
                custom_limit: Some(0),
                ..Default::default()
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
