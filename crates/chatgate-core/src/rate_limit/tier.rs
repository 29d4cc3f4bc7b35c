//! Rate-limit tiers

use crate::types::RequestContext;
use serde::{Deserialize, Serialize};

/// One granularity of rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitTier {
    /// Caller network address, applied to anonymous callers too
    Address,
    /// Authenticated subject
    Identity,
    /// Authenticated subject on one route pattern
    IdentityRoute,
}

impl RateLimitTier {
    /// Counter key for this tier, or `None` when the tier cannot apply
    pub fn key(&self, ctx: &RequestContext) -> Option<String> {
        match self {
            Self::Address => Some(format!("addr:{}", ctx.client_addr)),
            Self::Identity => ctx.identity.as_ref().map(|id| format!("id:{}", id)),
            Self::IdentityRoute => ctx
                .identity
                .as_ref()
                .map(|id| format!("id-route:{}:{}", id, ctx.route)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Identity => "identity",
            Self::IdentityRoute => "identity_route",
        }
    }
}

impl std::fmt::Display for RateLimitTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
