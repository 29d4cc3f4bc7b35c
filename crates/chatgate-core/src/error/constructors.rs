//! Constructor methods for GatewayError

use super::types::GatewayError;

impl GatewayError {
    /// Create a new provider stream error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::ProviderStream {
            message: message.into(),
            provider: None,
            context: None,
        }
    }

    /// Create a provider stream error naming the provider
    pub fn provider_named(message: impl Into<String>, provider: impl Into<String>) -> Self {
        Self::ProviderStream {
            message: message.into(),
            provider: Some(provider.into()),
            context: None,
        }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create an HTTP error with status code
    pub fn http_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Http {
            message: message.into(),
            url: None,
            status_code: Some(status_code),
        }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(self, ctx: impl Into<String>) -> Self {
        let ctx = Some(ctx.into());
        match self {
            Self::ProviderStream {
                message, provider, ..
            } => Self::ProviderStream {
                message,
                provider,
                context: ctx,
            },
            Self::Transport { message, .. } => Self::Transport {
                message,
                context: ctx,
            },
            Self::Config { message, .. } => Self::Config {
                message,
                context: ctx,
            },
            Self::Json { message, .. } => Self::Json {
                message,
                context: ctx,
            },
            Self::Storage { message, .. } => Self::Storage {
                message,
                context: ctx,
            },
            Self::Other { message, .. } => Self::Other {
                message,
                context: ctx,
            },
            other => other,
        }
    }
}
