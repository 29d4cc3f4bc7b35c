//! UnifiedError trait implementation for GatewayError

use super::types::{GatewayError, UnifiedError};

impl UnifiedError for GatewayError {
    fn error_code(&self) -> &str {
        match self {
            Self::RateLimitExceeded { .. } => "CHATGATE_RATE_LIMITED",
            Self::ProviderStream { .. } => "CHATGATE_PROVIDER",
            Self::Transport { .. } => "CHATGATE_TRANSPORT",
            Self::Config { .. } => "CHATGATE_CONFIG",
            Self::Http { .. } => "CHATGATE_HTTP",
            Self::Json { .. } => "CHATGATE_JSON",
            Self::Storage { .. } => "CHATGATE_STORAGE",
            Self::InvalidInput { .. } => "CHATGATE_INVALID_INPUT",
            Self::Cancelled => "CHATGATE_CANCELLED",
            Self::Other { .. } => "CHATGATE_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::RateLimitExceeded { .. } => "Rate limit exceeded",
            Self::ProviderStream { message, .. } => message,
            Self::Transport { message, .. } => message,
            Self::Config { message, .. } => message,
            Self::Http { message, .. } => message,
            Self::Json { message, .. } => message,
            Self::Storage { message, .. } => message,
            Self::InvalidInput { message, .. } => message,
            Self::Cancelled => "Operation was cancelled",
            Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::ProviderStream { context, .. } => context.as_deref(),
            Self::Transport { context, .. } => context.as_deref(),
            Self::Config { context, .. } => context.as_deref(),
            Self::Json { context, .. } => context.as_deref(),
            Self::Storage { context, .. } => context.as_deref(),
            Self::Other { context, .. } => context.as_deref(),
            Self::Http { url, .. } => url.as_deref(),
            Self::InvalidInput { field, .. } => field.as_deref(),
            Self::RateLimitExceeded { .. } | Self::Cancelled => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::RateLimitExceeded {
                retry_after_secs, ..
            } => format!(
                "Too many requests. Please retry in {} seconds.",
                retry_after_secs
            ),
            Self::ProviderStream { .. } | Self::Http { .. } | Self::Json { .. } => {
                "The model backend failed to produce a response. Please try again.".to_string()
            }
            Self::Transport { .. } | Self::Cancelled => "The response was interrupted.".to_string(),
            Self::InvalidInput { message, .. } => message.clone(),
            Self::Config { .. } | Self::Storage { .. } | Self::Other { .. } => {
                "An internal error occurred.".to_string()
            }
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. } | Self::ProviderStream { .. } | Self::Http { .. }
        )
    }
}
