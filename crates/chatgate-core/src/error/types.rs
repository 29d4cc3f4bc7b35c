//! Core error types and traits for chatgate

use crate::rate_limit::{RateLimitHeaders, RateLimitTier};
use thiserror::Error;

/// Result type alias for chatgate operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Unified error trait implemented by `GatewayError`.
///
/// - error_code(): Unique code for programmatic error identification
/// - message(): Human-readable error message
/// - context(): Optional additional context
/// - client_message(): Text that is safe to send to the end user
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Message that may be shown to the client without leaking internals
    fn client_message(&self) -> String;

    /// Check if this error is retryable by the client
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Main error type for chatgate
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// A request was rejected by one of the rate-limit tiers
    #[error("Rate limit exceeded for {tier} tier, retry after {retry_after_secs}s")]
    RateLimitExceeded {
        tier: RateLimitTier,
        retry_after_secs: u64,
        headers: RateLimitHeaders,
    },

    /// The model backend failed while producing a stream or completion
    #[error("Provider stream error: {message}")]
    ProviderStream {
        message: String,
        provider: Option<String>,
        context: Option<String>,
    },

    /// Writing to the client failed, usually a disconnect
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        context: Option<String>,
    },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// HTTP request errors against the model backend
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        url: Option<String>,
        status_code: Option<u16>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// Message persistence errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
    },

    /// The operation was cancelled
    #[error("Operation was cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}

impl GatewayError {
    /// Whether this error is an admission denial
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }

    /// Whether this error means the client is gone rather than something went wrong
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Cancelled)
    }

    /// Status code the request layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RateLimitExceeded { .. } => 429,
            Self::InvalidInput { .. } => 400,
            Self::ProviderStream { .. } | Self::Http { .. } => 502,
            Self::Transport { .. } | Self::Cancelled => 499,
            _ => 500,
        }
    }
}
