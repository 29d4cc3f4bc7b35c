//! Tiered, in-process request throttling
//!
//! Requests are admitted by up to three fixed-window counters evaluated in
//! order: caller address, authenticated identity, identity+route. All
//! counters live in one process-local `WindowedCounterStore`; nothing is
//! shared across processes.

mod clock;
mod headers;
mod store;
mod sweeper;
mod tier;
mod tiered;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use headers::RateLimitHeaders;
pub use store::{CounterDecision, CounterEntry, WindowedCounterStore};
pub use sweeper::{MIN_SWEEP_INTERVAL, spawn_sweeper};
pub use tier::RateLimitTier;
pub use tiered::{Admission, TierCheck, TieredRateLimiter};
