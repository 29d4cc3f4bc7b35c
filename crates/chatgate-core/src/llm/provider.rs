//! Model backend abstraction

use super::adapters::StreamEventAdapter;
use super::messages::{ChatMessage, CompletedMessage, CompletionOptions};
use super::native::NativeEventStream;
use crate::error::GatewayResult;
use async_trait::async_trait;

/// A model backend that can answer either incrementally or in one piece
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name used in logs and errors
    fn name(&self) -> &str;

    /// A fresh adapter for one stream from this provider
    fn adapter(&self) -> Box<dyn StreamEventAdapter>;

    /// Start a streaming completion
    async fn stream(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> GatewayResult<NativeEventStream>;

    /// Run a blocking completion
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> GatewayResult<CompletedMessage>;
}
