//! Standard rate-limit response headers

use super::store::CounterDecision;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Values for `X-RateLimit-*` and `Retry-After`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitHeaders {
    pub limit: u32,
    pub remaining: u32,
    /// Window end in unix seconds
    pub reset_at_secs: u64,
    /// Only present on denial
    pub retry_after_secs: Option<u64>,
}

impl RateLimitHeaders {
    /// Headers for a passed check
    pub fn allowed(decision: &CounterDecision) -> Self {
        Self {
            limit: decision.limit,
            remaining: decision.remaining,
            reset_at_secs: decision.reset_at_secs(),
            retry_after_secs: None,
        }
    }

    /// Headers for a failed check, including the retry hint
    pub fn denied(decision: &CounterDecision, now_millis: u64) -> Self {
        Self {
            limit: decision.limit,
            remaining: 0,
            reset_at_secs: decision.reset_at_secs(),
            retry_after_secs: Some(decision.retry_after_secs(now_millis)),
        }
    }

    /// Whether `self` is a tighter constraint than `other`
    pub fn is_more_restrictive_than(&self, other: &Self) -> bool {
        (self.remaining, self.limit) < (other.remaining, other.limit)
    }

    /// Header name and value pairs in emission order
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (LIMIT_HEADER, self.limit.to_string()),
            (REMAINING_HEADER, self.remaining.to_string()),
            (RESET_HEADER, self.reset_at_secs.to_string()),
        ];
        if let Some(retry_after) = self.retry_after_secs {
            pairs.push((RETRY_AFTER_HEADER, retry_after.to_string()));
        }
        pairs
    }

    /// Write these headers into a response header map, replacing earlier values
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(HeaderName::from_static(LIMIT_HEADER), HeaderValue::from(self.limit));
        headers.insert(
            HeaderName::from_static(REMAINING_HEADER),
            HeaderValue::from(self.remaining),
        );
        headers.insert(
            HeaderName::from_static(RESET_HEADER),
            HeaderValue::from(self.reset_at_secs),
        );
        match self.retry_after_secs {
            Some(retry_after) => {
                headers.insert(
                    HeaderName::from_static(RETRY_AFTER_HEADER),
                    HeaderValue::from(retry_after),
                );
            }
            None => {
                headers.remove(RETRY_AFTER_HEADER);
            }
        }
    }

    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.apply(&mut headers);
        headers
    }
}
