//! Tests for the counter store and tiered limiter

use super::*;
use crate::config::{RateLimitSettings, RouteOverride, TierConfig};
use crate::error::GatewayError;
use crate::types::RequestContext;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const START: u64 = 1_700_000_000_000;
const MINUTE: Duration = Duration::from_secs(60);

fn store_at(start: u64) -> (ManualClock, Arc<WindowedCounterStore>) {
    let clock = ManualClock::new(start);
    let store = Arc::new(WindowedCounterStore::with_clock(Arc::new(clock.clone())));
    (clock, store)
}

fn settings(address: u32, identity: u32, identity_route: u32) -> RateLimitSettings {
    RateLimitSettings {
        address: TierConfig::new(address, MINUTE),
        identity: TierConfig::new(identity, MINUTE),
        identity_route: TierConfig::new(identity_route, MINUTE),
        ..Default::default()
    }
}

fn limiter(settings: RateLimitSettings) -> (ManualClock, TieredRateLimiter) {
    let (clock, store) = store_at(START);
    (clock, TieredRateLimiter::new(store, Arc::new(settings)))
}

fn denied_tier(result: crate::error::GatewayResult<Admission>) -> RateLimitTier {
    match result {
        Err(GatewayError::RateLimitExceeded { tier, .. }) => tier,
        other => panic!("expected rate limit denial, got {:?}", other),
    }
}

#[test]
fn test_remaining_decreases_until_limit() {
    let (_clock, store) = store_at(START);

    let mut last = u32::MAX;
    for _ in 0..5 {
        let decision = store.check("k", 5, MINUTE);
        assert!(decision.allowed);
        assert!(decision.remaining < last);
        if last != u32::MAX {
            assert_eq!(decision.remaining, last - 1);
        }
        last = decision.remaining;
    }
    assert_eq!(last, 0);
}

#[test]
fn test_denial_keeps_original_reset() {
    let (clock, store) = store_at(START);

    let first = store.check("k", 2, MINUTE);
    clock.advance(Duration::from_secs(10));
    store.check("k", 2, MINUTE);
    clock.advance(Duration::from_secs(10));

    let denied = store.check("k", 2, MINUTE);
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert_eq!(denied.reset_at, first.reset_at);
    assert_eq!(denied.reset_at, START + 60_000);

    // Denials are not counted
    assert_eq!(store.peek("k").unwrap().count, 2);
}

#[test]
fn test_expired_window_starts_fresh() {
    let (clock, store) = store_at(START);
    for _ in 0..3 {
        store.check("k", 3, MINUTE);
    }
    assert!(!store.check("k", 3, MINUTE).allowed);

    clock.advance(MINUTE);
    let decision = store.check("k", 3, MINUTE);
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 2);
    assert_eq!(store.peek("k").unwrap().count, 1);
    assert_eq!(decision.reset_at, START + 120_000);
}

#[test]
fn test_window_boundary_allows_double_burst() {
    let (clock, store) = store_at(START);
    clock.advance(Duration::from_secs(59));
    for _ in 0..2 {
        assert!(store.check("k", 2, MINUTE).allowed);
    }
    clock.advance(Duration::from_secs(60));
    for _ in 0..2 {
        assert!(store.check("k", 2, MINUTE).allowed);
    }
}

#[test]
fn test_zero_limit_always_denies() {
    let (_clock, store) = store_at(START);
    assert!(!store.check("k", 0, MINUTE).allowed);
    assert!(store.is_empty());
}

#[test]
fn test_sweep_removes_only_expired() {
    let (clock, store) = store_at(START);
    store.check("short", 5, Duration::from_secs(1));
    store.check("long", 5, MINUTE);

    clock.advance(Duration::from_secs(2));
    assert_eq!(store.sweep(), 1);
    assert!(store.peek("short").is_none());
    assert!(store.peek("long").is_some());
}

#[tokio::test]
async fn test_sweeper_task_evicts_and_stops() {
    let (clock, store) = store_at(START);
    store.check("k", 5, Duration::from_secs(1));
    clock.advance(Duration::from_secs(5));

    let cancel = CancellationToken::new();
    let handle = spawn_sweeper(store.clone(), Duration::from_millis(5), cancel.clone());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.is_empty());

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_zero_sweep_interval_is_raised_not_fatal() {
    let (clock, store) = store_at(START);
    store.check("k", 5, Duration::from_secs(1));
    clock.advance(Duration::from_secs(5));

    let cancel = CancellationToken::new();
    let handle = spawn_sweeper(store.clone(), Duration::ZERO, cancel.clone());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.is_empty());

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_limiter_sweeps_at_configured_interval() {
    let mut config = crate::config::Config::default();
    config.rate_limit.sweep_interval = Duration::from_millis(5);
    config.rate_limit.address = TierConfig::new(10, Duration::from_secs(1));
    config.validate().unwrap();

    let (clock, store) = store_at(START);
    let limiter = TieredRateLimiter::new(store.clone(), Arc::new(config.rate_limit));
    for addr in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        limiter.check(&RequestContext::new(addr, "GET /chats")).unwrap();
    }
    assert_eq!(store.len(), 3);

    let cancel = CancellationToken::new();
    let handle = limiter.spawn_sweeper(cancel.clone());
    clock.advance(Duration::from_secs(2));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.is_empty());

    cancel.cancel();
    handle.await.unwrap();
}

#[test]
fn test_anonymous_caller_only_hits_address_tier() {
    let (_clock, limiter) = limiter(settings(10, 10, 10));
    let ctx = RequestContext::new("10.0.0.1", "GET /chats");

    let admission = limiter.check(&ctx).unwrap();
    assert_eq!(admission.tiers, vec![RateLimitTier::Address]);
    assert_eq!(admission.headers.unwrap().remaining, 9);
}

#[test]
fn test_authenticated_caller_runs_all_tiers_in_order() {
    let (_clock, limiter) = limiter(settings(10, 10, 10));
    let ctx = RequestContext::new("10.0.0.1", "GET /chats").with_identity("user-1");

    let admission = limiter.check(&ctx).unwrap();
    assert_eq!(
        admission.tiers,
        vec![
            RateLimitTier::Address,
            RateLimitTier::Identity,
            RateLimitTier::IdentityRoute
        ]
    );
}

#[test]
fn test_headers_reflect_most_restrictive_tier() {
    let (_clock, limiter) = limiter(settings(100, 50, 3));
    let ctx = RequestContext::new("10.0.0.1", "POST /chats").with_identity("user-1");

    let headers = limiter.check(&ctx).unwrap().headers.unwrap();
    assert_eq!(headers.limit, 3);
    assert_eq!(headers.remaining, 2);
    assert_eq!(headers.retry_after_secs, None);
}

#[test]
fn test_failed_tier_short_circuits() {
    let (_clock, limiter) = limiter(settings(100, 1, 100));
    let ctx = RequestContext::new("10.0.0.1", "GET /chats").with_identity("user-1");

    limiter.check(&ctx).unwrap();
    let err = limiter.check(&ctx).unwrap_err();
    match &err {
        GatewayError::RateLimitExceeded {
            tier,
            retry_after_secs,
            headers,
        } => {
            assert_eq!(*tier, RateLimitTier::Identity);
            assert_eq!(*retry_after_secs, 60);
            assert_eq!(headers.limit, 1);
            assert_eq!(headers.remaining, 0);
            assert_eq!(headers.retry_after_secs, Some(60));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err.status_code(), 429);

    // The identity+route counter was never touched by the denied request
    let route_key = RateLimitTier::IdentityRoute.key(&ctx).unwrap();
    assert_eq!(limiter.store().peek(&route_key).unwrap().count, 1);
}

#[test]
fn test_address_tier_runs_first() {
    let (_clock, limiter) = limiter(settings(1, 100, 100));
    let ctx = RequestContext::new("10.0.0.1", "GET /chats").with_identity("user-1");

    limiter.check(&ctx).unwrap();
    assert_eq!(denied_tier(limiter.check(&ctx)), RateLimitTier::Address);

    let identity_key = RateLimitTier::Identity.key(&ctx).unwrap();
    assert_eq!(limiter.store().peek(&identity_key).unwrap().count, 1);
}

#[test]
fn test_skip_identity_check_still_applies_address_tier() {
    let settings = settings(2, 1, 100).with_route("POST /chats", RouteOverride::default().skip_identity());
    let (_clock, limiter) = limiter(settings);
    let ctx = RequestContext::new("10.0.0.1", "POST /chats").with_identity("user-1");

    // Identity limit is 1 but skipped on this route
    let first = limiter.check(&ctx).unwrap();
    assert_eq!(
        first.tiers,
        vec![RateLimitTier::Address, RateLimitTier::IdentityRoute]
    );
    limiter.check(&ctx).unwrap();

    // Address limit exhausted while identity and route counters have room
    assert_eq!(denied_tier(limiter.check(&ctx)), RateLimitTier::Address);
    let identity_key = RateLimitTier::Identity.key(&ctx).unwrap();
    assert!(limiter.store().peek(&identity_key).is_none());
}

#[test]
fn test_disabled_route_only_runs_address_tier() {
    let settings = settings(10, 1, 1).with_route("GET /health", RouteOverride::disabled());
    let (_clock, limiter) = limiter(settings);
    let ctx = RequestContext::new("10.0.0.1", "GET /health").with_identity("user-1");

    for _ in 0..5 {
        let admission = limiter.check(&ctx).unwrap();
        assert_eq!(admission.tiers, vec![RateLimitTier::Address]);
    }
}

#[test]
fn test_custom_route_limit_and_window() {
    let settings = settings(100, 100, 100).with_route(
        "POST /chats/:id/messages",
        RouteOverride::default().with_limit(2, Duration::from_secs(10)),
    );
    let (clock, limiter) = limiter(settings);
    let ctx = RequestContext::new("10.0.0.1", "POST /chats/:id/messages").with_identity("user-1");

    let headers = limiter.check(&ctx).unwrap().headers.unwrap();
    assert_eq!(headers.limit, 2);
    limiter.check(&ctx).unwrap();
    assert_eq!(denied_tier(limiter.check(&ctx)), RateLimitTier::IdentityRoute);

    clock.advance(Duration::from_secs(10));
    assert!(limiter.check(&ctx).is_ok());

    // Other routes keep the default identity+route limit
    let other = RequestContext::new("10.0.0.1", "GET /chats").with_identity("user-1");
    let headers = limiter.check(&other).unwrap().headers.unwrap();
    assert_eq!(headers.limit, 100);
}

#[test]
fn test_master_switch_admits_everything() {
    let (_clock, limiter) = limiter(RateLimitSettings {
        address: TierConfig::new(1, MINUTE),
        ..RateLimitSettings::disabled()
    });
    let ctx = RequestContext::new("10.0.0.1", "GET /chats");

    for _ in 0..3 {
        let admission = limiter.check(&ctx).unwrap();
        assert!(admission.headers.is_none());
        assert!(admission.tiers.is_empty());
    }
}

#[test]
fn test_identities_are_counted_separately() {
    let (_clock, limiter) = limiter(settings(100, 1, 100));
    let alice = RequestContext::new("10.0.0.1", "GET /chats").with_identity("alice");
    let bob = RequestContext::new("10.0.0.1", "GET /chats").with_identity("bob");

    limiter.check(&alice).unwrap();
    limiter.check(&bob).unwrap();
    assert!(limiter.check(&alice).is_err());
}

#[test]
fn test_concurrent_checks_never_exceed_limit() {
    let (_clock, store) = store_at(START);
    let allowed = std::sync::atomic::AtomicU32::new(0);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..50 {
                    if store.check("shared", 100, MINUTE).allowed {
                        allowed.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    }
                }
            });
        }
    });

    assert_eq!(allowed.into_inner(), 100);
}
