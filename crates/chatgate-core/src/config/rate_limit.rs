//! Rate-limit tier configuration
//!
//! Durations are written in human form in config files:
//!
//! ```toml
//! [rate_limit]
//! sweep_interval = "1m"
//!
//! [rate_limit.address]
//! window = "15m"
//! max_requests = 100
//!
//! [rate_limit.routes."POST /chats/:id/messages"]
//! customLimit = 10
//! customWindow = "1m"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Window and ceiling for one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Length of one fixed window
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Requests allowed per window
    pub max_requests: u32,
}

impl TierConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            window,
            max_requests,
        }
    }
}

/// Per-route adjustments to the identity+route tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOverride {
    /// `Some(false)` leaves only the address tier for this route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Replaces the identity+route tier's `max_requests`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_limit: Option<u32>,

    /// Replaces the identity+route tier's `window`
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_window: Option<Duration>,

    /// Drops the identity tier for this route only
    #[serde(default)]
    pub skip_identity_check: bool,
}

impl RouteOverride {
    pub fn disabled() -> Self {
        Self {
            enabled: Some(false),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: u32, window: Duration) -> Self {
        self.custom_limit = Some(limit);
        self.custom_window = Some(window);
        self
    }

    pub fn skip_identity(mut self) -> Self {
        self.skip_identity_check = true;
        self
    }

    /// Whether tiers beyond the address tier run for this route
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// All rate limiting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Master switch; when false every request is admitted
    pub enabled: bool,

    /// How often expired counters are evicted
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Per caller address, applied to every request
    pub address: TierConfig,

    /// Per authenticated identity
    pub identity: TierConfig,

    /// Per identity and route pattern
    pub identity_route: TierConfig,

    /// Overrides keyed by route pattern
    pub routes: HashMap<String, RouteOverride>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval: Duration::from_secs(60),
            address: TierConfig::new(100, Duration::from_secs(15 * 60)),
            identity: TierConfig::new(300, Duration::from_secs(15 * 60)),
            identity_route: TierConfig::new(60, Duration::from_secs(60)),
            routes: HashMap::new(),
        }
    }
}

impl RateLimitSettings {
    /// Settings with rate limiting switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_route(mut self, route: impl Into<String>, route_override: RouteOverride) -> Self {
        self.routes.insert(route.into(), route_override);
        self
    }

    pub fn route_override(&self, route: &str) -> Option<&RouteOverride> {
        self.routes.get(route)
    }
}
