//! Three-tier admission control

use super::headers::RateLimitHeaders;
use super::store::WindowedCounterStore;
use super::sweeper;
use super::tier::RateLimitTier;
use crate::config::RateLimitSettings;
use crate::error::{GatewayError, GatewayResult};
use crate::types::RequestContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One resolved counter check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierCheck {
    pub tier: RateLimitTier,
    pub key: String,
    pub limit: u32,
    pub window: Duration,
}

/// A request that passed every applicable tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Headers of the most restrictive passed tier; `None` when limiting is off
    pub headers: Option<RateLimitHeaders>,
    /// Tiers evaluated, in order
    pub tiers: Vec<RateLimitTier>,
}

/// Composes address, identity and identity+route checks over a shared store
///
/// Holds no counters of its own; construct once at startup and hand out
/// clones.
#[derive(Debug, Clone)]
pub struct TieredRateLimiter {
    store: Arc<WindowedCounterStore>,
    settings: Arc<RateLimitSettings>,
}

impl TieredRateLimiter {
    pub fn new(store: Arc<WindowedCounterStore>, settings: Arc<RateLimitSettings>) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<WindowedCounterStore> {
        &self.store
    }

    pub fn settings(&self) -> &RateLimitSettings {
        &self.settings
    }

    /// Evict expired counters every `sweep_interval` until `cancel` fires
    pub fn spawn_sweeper(&self, cancel: CancellationToken) -> JoinHandle<()> {
        sweeper::spawn_sweeper(self.store.clone(), self.settings.sweep_interval, cancel)
    }

    /// Resolve which tiers apply to a request, in evaluation order
    pub fn plan(&self, ctx: &RequestContext) -> Vec<TierCheck> {
        let settings = &self.settings;
        if !settings.enabled {
            return Vec::new();
        }

        let mut checks = Vec::with_capacity(3);
        if let Some(key) = RateLimitTier::Address.key(ctx) {
            checks.push(TierCheck {
                tier: RateLimitTier::Address,
                key,
                limit: settings.address.max_requests,
                window: settings.address.window,
            });
        }

        let route_override = settings.route_override(&ctx.route);
        if route_override.is_some_and(|o| !o.is_enabled()) {
            return checks;
        }

        let skip_identity = route_override.is_some_and(|o| o.skip_identity_check);
        if !skip_identity {
            if let Some(key) = RateLimitTier::Identity.key(ctx) {
                checks.push(TierCheck {
                    tier: RateLimitTier::Identity,
                    key,
                    limit: settings.identity.max_requests,
                    window: settings.identity.window,
                });
            }
        }

        if let Some(key) = RateLimitTier::IdentityRoute.key(ctx) {
            let defaults = &settings.identity_route;
            checks.push(TierCheck {
                tier: RateLimitTier::IdentityRoute,
                key,
                limit: route_override
                    .and_then(|o| o.custom_limit)
                    .unwrap_or(defaults.max_requests),
                window: route_override
                    .and_then(|o| o.custom_window)
                    .unwrap_or(defaults.window),
            });
        }

        checks
    }

    /// Admit or reject a request
    ///
    /// The first failing tier short-circuits the rest and is reported as
    /// `GatewayError::RateLimitExceeded` carrying that tier's headers.
    pub fn check(&self, ctx: &RequestContext) -> GatewayResult<Admission> {
        let mut admission = Admission {
            headers: None,
            tiers: Vec::with_capacity(3),
        };

        for check in self.plan(ctx) {
            admission.tiers.push(check.tier);
            let decision = self.store.check(&check.key, check.limit, check.window);

            if !decision.allowed {
                let headers = RateLimitHeaders::denied(&decision, self.store.now_millis());
                let retry_after_secs = headers.retry_after_secs.unwrap_or(1);
                warn!(
                    tier = %check.tier,
                    key = %check.key,
                    limit = check.limit,
                    retry_after_secs,
                    "Rate limit exceeded"
                );
                return Err(GatewayError::RateLimitExceeded {
                    tier: check.tier,
                    retry_after_secs,
                    headers,
                });
            }

            let passed = RateLimitHeaders::allowed(&decision);
            debug!(
                tier = %check.tier,
                remaining = passed.remaining,
                limit = passed.limit,
                "Rate limit tier passed"
            );
            admission.headers = match admission.headers {
                Some(current) if !passed.is_more_restrictive_than(&current) => Some(current),
                _ => Some(passed),
            };
        }

        Ok(admission)
    }
}
