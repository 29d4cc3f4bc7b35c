//! Streaming and blocking reply strategies behind one contract
//!
//! Whichever strategy runs, exactly one assistant message holding the final
//! text and matched tool calls is appended to the store before a reply is
//! returned.

use super::messages::{ChatMessage, CompletedMessage, CompletionOptions};
use super::native::{NativeEvent, NativeEventStream};
use super::orchestrator::{StreamFailure, StreamingOrchestrator};
use super::provider::ChatProvider;
use super::transport::ChunkTransport;
use crate::config::ChatConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::types::RequestContext;
use async_trait::async_trait;
use chatgate_session::MessageStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Finish reason stored on a reply cut short by an error
pub const INCOMPLETE_FINISH_REASON: &str = "incomplete";

/// How the reply reached the client
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Delivered chunk by chunk over the transport
    Streamed(CompletedMessage),
    /// Returned whole; the caller renders it
    Complete(CompletedMessage),
}

impl Reply {
    pub fn message(&self) -> &CompletedMessage {
        match self {
            Self::Streamed(message) | Self::Complete(message) => message,
        }
    }

    pub fn into_message(self) -> CompletedMessage {
        match self {
            Self::Streamed(message) | Self::Complete(message) => message,
        }
    }

    pub fn is_streamed(&self) -> bool {
        matches!(self, Self::Streamed(_))
    }
}

/// Everything one chat turn needs
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub context: &'a RequestContext,
    pub chat_id: &'a str,
    pub messages: &'a [ChatMessage],
    pub options: &'a CompletionOptions,
    /// Cancelled when the client goes away
    pub cancel: Option<CancellationToken>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(
        context: &'a RequestContext,
        chat_id: &'a str,
        messages: &'a [ChatMessage],
        options: &'a CompletionOptions,
    ) -> Self {
        Self {
            context,
            chat_id,
            messages,
            options,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// One way of producing and persisting a reply
#[async_trait]
pub trait ResponseStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        request: ChatRequest<'_>,
        transport: Option<&mut dyn ChunkTransport>,
    ) -> GatewayResult<Reply>;
}

async fn persist(
    store: &dyn MessageStore,
    chat_id: &str,
    completed: &CompletedMessage,
) -> GatewayResult<()> {
    let message = completed.to_message(chat_id);
    let message_id = message.id.clone();
    store.append(message).await?;
    debug!(chat_id, message_id = %message_id, "Assistant message persisted");
    Ok(())
}

/// Streams through the orchestrator, then persists what it accumulated
pub struct StreamingStrategy {
    provider: Arc<dyn ChatProvider>,
    store: Arc<dyn MessageStore>,
}

impl StreamingStrategy {
    pub fn new(provider: Arc<dyn ChatProvider>, store: Arc<dyn MessageStore>) -> Self {
        Self { provider, store }
    }

    /// Persist a failed stream's partial output, if there is any
    async fn persist_partial(&self, chat_id: &str, failure: StreamFailure) -> GatewayError {
        let StreamFailure { error, partial } = failure;
        if !partial.has_output() {
            debug!(chat_id, "Failed stream produced nothing to persist");
            return error;
        }

        let mut completed = partial.into_completed();
        if completed.finish_reason.is_none() {
            completed.finish_reason = Some(INCOMPLETE_FINISH_REASON.to_string());
        }
        if let Err(store_err) = persist(self.store.as_ref(), chat_id, &completed).await {
            error!(chat_id, error = %store_err, "Failed to persist partial reply");
        }
        error
    }
}

#[async_trait]
impl ResponseStrategy for StreamingStrategy {
    fn name(&self) -> &'static str {
        "streaming"
    }

    async fn execute(
        &self,
        request: ChatRequest<'_>,
        transport: Option<&mut dyn ChunkTransport>,
    ) -> GatewayResult<Reply> {
        let transport = transport.ok_or_else(|| {
            GatewayError::invalid_input_field("Streaming reply requires a transport", "transport")
        })?;

        // Setup failures still reach the client as a terminal error chunk
        let events: NativeEventStream =
            match self.provider.stream(request.messages, request.options).await {
                Ok(events) => events,
                Err(e) => Box::pin(futures::stream::once(async move { Err::<NativeEvent, _>(e) })),
            };

        let mut orchestrator = StreamingOrchestrator::new(self.provider.adapter());
        if let Some(token) = request.cancel.clone() {
            orchestrator = orchestrator.with_cancellation(token);
        }

        match orchestrator.run(events, transport).await {
            Ok(result) => {
                let completed = result.into_completed();
                persist(self.store.as_ref(), request.chat_id, &completed).await?;
                Ok(Reply::Streamed(completed))
            }
            Err(failure) => Err(self.persist_partial(request.chat_id, failure).await),
        }
    }
}

/// One blocking completion, persisted before it is returned
pub struct BlockingStrategy {
    provider: Arc<dyn ChatProvider>,
    store: Arc<dyn MessageStore>,
}

impl BlockingStrategy {
    pub fn new(provider: Arc<dyn ChatProvider>, store: Arc<dyn MessageStore>) -> Self {
        Self { provider, store }
    }
}

#[async_trait]
impl ResponseStrategy for BlockingStrategy {
    fn name(&self) -> &'static str {
        "blocking"
    }

    async fn execute(
        &self,
        request: ChatRequest<'_>,
        _transport: Option<&mut dyn ChunkTransport>,
    ) -> GatewayResult<Reply> {
        let completion = self.provider.complete(request.messages, request.options);
        let completed = match request.cancel.clone() {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(GatewayError::Cancelled),
                completed = completion => completed?,
            },
            None => completion.await?,
        };

        persist(self.store.as_ref(), request.chat_id, &completed).await?;
        Ok(Reply::Complete(completed))
    }
}

/// Picks the strategy once per call from `ChatConfig::streaming_enabled`
pub struct ResponseStrategySelector {
    streaming: StreamingStrategy,
    blocking: BlockingStrategy,
    config: ChatConfig,
}

impl ResponseStrategySelector {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        store: Arc<dyn MessageStore>,
        config: ChatConfig,
    ) -> Self {
        Self {
            streaming: StreamingStrategy::new(provider.clone(), store.clone()),
            blocking: BlockingStrategy::new(provider, store),
            config,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn select(&self) -> &dyn ResponseStrategy {
        if self.config.streaming_enabled {
            &self.streaming
        } else {
            &self.blocking
        }
    }

    /// Produce and persist one assistant reply
    pub async fn execute(
        &self,
        context: &RequestContext,
        chat_id: &str,
        messages: &[ChatMessage],
        options: &CompletionOptions,
        transport: Option<&mut dyn ChunkTransport>,
    ) -> GatewayResult<Reply> {
        self.execute_request(ChatRequest::new(context, chat_id, messages, options), transport)
            .await
    }

    pub async fn execute_request(
        &self,
        request: ChatRequest<'_>,
        transport: Option<&mut dyn ChunkTransport>,
    ) -> GatewayResult<Reply> {
        let strategy = self.select();
        info!(
            chat_id = request.chat_id,
            strategy = strategy.name(),
            identity = request.context.identity.as_deref().unwrap_or("-"),
            "Executing chat turn"
        );
        strategy.execute(request, transport).await
    }
}
