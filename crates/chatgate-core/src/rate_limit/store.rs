//! Fixed-window counter store

use super::clock::{Clock, SystemClock};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;

/// Count and window end for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterEntry {
    pub count: u32,
    /// Window end in unix milliseconds
    pub reset_at: u64,
}

impl CounterEntry {
    fn fresh(now: u64, window: Duration) -> Self {
        Self {
            count: 1,
            reset_at: now.saturating_add(window.as_millis() as u64),
        }
    }

    /// An entry is logically absent once its window has ended
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.reset_at
    }
}

/// Outcome of one counter check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Window end in unix milliseconds
    pub reset_at: u64,
}

impl CounterDecision {
    /// Window end in whole unix seconds, rounded up
    pub fn reset_at_secs(&self) -> u64 {
        self.reset_at.div_ceil(1000)
    }

    /// Seconds until the window ends, never less than one
    pub fn retry_after_secs(&self, now: u64) -> u64 {
        self.reset_at.saturating_sub(now).div_ceil(1000).max(1)
    }
}

/// Process-local key to counter table
///
/// Each check touches exactly one map entry under DashMap's shard lock, so
/// concurrent checks for the same key never interleave mid-update while
/// checks for different keys rarely contend.
///
/// This is a fixed-window counter: a caller can land up to twice the limit
/// across a window boundary.
#[derive(Debug)]
pub struct WindowedCounterStore {
    entries: DashMap<String, CounterEntry>,
    clock: Arc<dyn Clock>,
}

impl Default for WindowedCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowedCounterStore {
    /// Create a store backed by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Count one request against `key`
    ///
    /// Denials do not increment the counter and report the `reset_at`
    /// established when the window opened.
    pub fn check(&self, key: &str, limit: u32, window: Duration) -> CounterDecision {
        let now = self.clock.now_millis();

        if limit == 0 {
            return CounterDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset_at: now.saturating_add(window.as_millis() as u64),
            };
        }

        match self.entries.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                let entry = vacant.insert(CounterEntry::fresh(now, window));
                allowed(limit, &entry)
            }
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.is_expired(now) {
                    *entry = CounterEntry::fresh(now, window);
                    allowed(limit, entry)
                } else if entry.count >= limit {
                    CounterDecision {
                        allowed: false,
                        limit,
                        remaining: 0,
                        reset_at: entry.reset_at,
                    }
                } else {
                    entry.count += 1;
                    allowed(limit, entry)
                }
            }
        }
    }

    /// Current entry for a key, ignoring expiry
    pub fn peek(&self, key: &str) -> Option<CounterEntry> {
        self.entries.get(key).map(|e| *e)
    }

    /// Evict expired entries, returning how many were removed
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    /// Number of stored keys, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

fn allowed(limit: u32, entry: &CounterEntry) -> CounterDecision {
    CounterDecision {
        allowed: true,
        limit,
        remaining: limit.saturating_sub(entry.count),
        reset_at: entry.reset_at,
    }
}
