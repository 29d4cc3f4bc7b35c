//! Tiered admission driven from loaded configuration

use chatgate_core::config::{ConfigLoader, RouteOverride};
use chatgate_core::error::GatewayError;
use chatgate_core::rate_limit::{
    ManualClock, RateLimitTier, TieredRateLimiter, WindowedCounterStore,
};
use chatgate_core::types::RequestContext;
use std::sync::Arc;
use std::time::Duration;

const CHAT_ROUTE: &str = "POST /chats/:id/messages";

fn limiter_from_vars(vars: &[(&str, &str)]) -> (TieredRateLimiter, Arc<ManualClock>) {
    let config = ConfigLoader::new()
        .with_defaults()
        .with_vars(vars.iter().copied())
        .load()
        .unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let store = Arc::new(WindowedCounterStore::with_clock(clock.clone()));
    (
        TieredRateLimiter::new(store, Arc::new(config.rate_limit)),
        clock,
    )
}

fn denied(limiter: &TieredRateLimiter, ctx: &RequestContext) -> Option<RateLimitTier> {
    match limiter.check(ctx) {
        Ok(_) => None,
        Err(GatewayError::RateLimitExceeded { tier, .. }) => Some(tier),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_anonymous_caller_is_bounded_by_address_tier() {
    let (limiter, _) = limiter_from_vars(&[("CHATGATE_RATE_LIMIT_ADDRESS_MAX", "3")]);
    let ctx = RequestContext::new("203.0.113.9", CHAT_ROUTE);

    for _ in 0..3 {
        assert_eq!(denied(&limiter, &ctx), None);
    }
    assert_eq!(denied(&limiter, &ctx), Some(RateLimitTier::Address));

    // Another address has its own counter
    let other = RequestContext::new("203.0.113.10", CHAT_ROUTE);
    assert_eq!(denied(&limiter, &other), None);
}

#[test]
fn test_identity_tier_spans_addresses() {
    let (limiter, _) = limiter_from_vars(&[("CHATGATE_RATE_LIMIT_IDENTITY_MAX", "2")]);

    let home = RequestContext::new("198.51.100.1", "GET /chats").with_identity("alice");
    let office = RequestContext::new("198.51.100.2", CHAT_ROUTE).with_identity("alice");

    assert_eq!(denied(&limiter, &home), None);
    assert_eq!(denied(&limiter, &office), None);
    assert_eq!(denied(&limiter, &home), Some(RateLimitTier::Identity));
}

#[test]
fn test_denial_carries_standard_headers() {
    let (limiter, clock) = limiter_from_vars(&[
        ("CHATGATE_RATE_LIMIT_IDENTITY_ROUTE_MAX", "1"),
        ("CHATGATE_RATE_LIMIT_IDENTITY_ROUTE_WINDOW", "1m"),
    ]);
    let ctx = RequestContext::new("198.51.100.1", CHAT_ROUTE).with_identity("bob");

    let admission = limiter.check(&ctx).unwrap();
    let headers = admission.headers.unwrap();
    assert_eq!(headers.limit, 1);
    assert_eq!(headers.remaining, 0);

    clock.advance(Duration::from_secs(15));
    let err = limiter.check(&ctx).unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.status_code(), 429);
    let GatewayError::RateLimitExceeded {
        tier,
        retry_after_secs,
        headers,
    } = err
    else {
        panic!("expected a rate-limit denial");
    };
    assert_eq!(tier, RateLimitTier::IdentityRoute);
    assert_eq!(retry_after_secs, 45);

    let map = headers.to_header_map();
    assert_eq!(map.get("x-ratelimit-limit").unwrap(), "1");
    assert_eq!(map.get("x-ratelimit-remaining").unwrap(), "0");
    assert_eq!(map.get("retry-after").unwrap(), "45");

    // A fresh window admits again
    clock.advance(Duration::from_secs(45));
    assert!(limiter.check(&ctx).is_ok());
}

#[test]
fn test_route_override_relaxes_one_route_only() {
    let config = ConfigLoader::new().with_defaults().load().unwrap();
    let settings = config.rate_limit.with_route(
        "GET /health",
        RouteOverride::disabled(),
    );
    let limiter = TieredRateLimiter::new(
        Arc::new(WindowedCounterStore::new()),
        Arc::new(settings),
    );

    let health = RequestContext::new("192.0.2.1", "GET /health").with_identity("carol");
    let chat = RequestContext::new("192.0.2.1", CHAT_ROUTE).with_identity("carol");

    assert_eq!(limiter.check(&health).unwrap().tiers, vec![RateLimitTier::Address]);
    assert_eq!(
        limiter.check(&chat).unwrap().tiers,
        vec![
            RateLimitTier::Address,
            RateLimitTier::Identity,
            RateLimitTier::IdentityRoute
        ]
    );
}

#[test]
fn test_disabled_limiting_admits_without_headers() {
    let (limiter, _) = limiter_from_vars(&[
        ("CHATGATE_RATE_LIMIT_ENABLED", "false"),
        ("CHATGATE_RATE_LIMIT_ADDRESS_MAX", "1"),
    ]);
    let ctx = RequestContext::new("192.0.2.7", CHAT_ROUTE);

    for _ in 0..5 {
        let admission = limiter.check(&ctx).unwrap();
        assert!(admission.headers.is_none());
        assert!(admission.tiers.is_empty());
    }
    assert!(limiter.store().is_empty());
}
