//! Model backend clients

mod anthropic;
pub mod error_utils;
mod openai;
mod replay;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use replay::ReplayProvider;

use super::provider::ChatProvider;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::GatewayResult;
use std::sync::Arc;

/// Build the configured backend client
pub fn build_provider(config: &ProviderConfig) -> GatewayResult<Arc<dyn ChatProvider>> {
    tracing::debug!(kind = %config.kind, model = %config.model, "Building provider");
    Ok(match config.kind {
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(config.clone())?),
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(config.clone())?),
    })
}
