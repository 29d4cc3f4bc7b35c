//! Drives one provider stream to a terminal state
//!
//! Every translated chunk is written to the transport as soon as it is
//! produced. Text and matched tool calls are accumulated along the way and
//! handed back to the caller, which owns persistence.

use super::accumulator::AccumulatedResult;
use super::adapters::StreamEventAdapter;
use super::chunk::StreamChunk;
use super::correlator::ToolCallCorrelator;
use super::native::NativeEventStream;
use super::transport::ChunkTransport;
use crate::error::{GatewayError, GatewayResult, UnifiedError};
use chatgate_session::ToolCallRecord;
use futures::StreamExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle of one orchestrated stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    NotStarted,
    Streaming,
    Completed,
    Failed,
}

/// A stream that ended in error, with whatever was generated before it
#[derive(Debug, Error)]
#[error("{error}")]
pub struct StreamFailure {
    pub error: GatewayError,
    pub partial: AccumulatedResult,
}

/// Single-use driver for one provider stream
pub struct StreamingOrchestrator {
    adapter: Box<dyn StreamEventAdapter>,
    correlator: ToolCallCorrelator,
    accumulator: AccumulatedResult,
    state: StreamState,
    cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for StreamingOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingOrchestrator")
            .field("provider", &self.adapter.provider())
            .field("state", &self.state)
            .field("pending_tool_calls", &self.correlator.pending_count())
            .finish()
    }
}

impl StreamingOrchestrator {
    pub fn new(adapter: Box<dyn StreamEventAdapter>) -> Self {
        Self {
            adapter,
            correlator: ToolCallCorrelator::new(),
            accumulator: AccumulatedResult::new(),
            state: StreamState::NotStarted,
            cancel: None,
        }
    }

    /// Stop the stream when `token` is cancelled, e.g. on client disconnect
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Run the stream to completion or failure
    ///
    /// The transport is closed exactly once before this returns, on every
    /// path. On failure a single `error` chunk with a client-safe message is
    /// attempted first and the partial result is returned with the error.
    pub async fn run(
        &mut self,
        events: NativeEventStream,
        transport: &mut dyn ChunkTransport,
    ) -> Result<AccumulatedResult, StreamFailure> {
        if self.state != StreamState::NotStarted {
            return Err(StreamFailure {
                error: GatewayError::invalid_input("stream already started"),
                partial: AccumulatedResult::new(),
            });
        }
        self.state = StreamState::Streaming;
        let provider = self.adapter.provider().to_string();
        debug!(provider = %provider, "Stream started");

        let mut outcome = self.drive(events, transport).await;
        if outcome.is_ok() {
            outcome = transport.send(&StreamChunk::Done).await;
        }

        if let Err(e) = &outcome {
            let chunk = StreamChunk::error(e.client_message());
            if let Err(send_err) = transport.send(&chunk).await {
                debug!(error = %send_err, "Could not deliver error chunk");
            }
        }

        if let Err(close_err) = transport.close().await {
            warn!(provider = %provider, error = %close_err, "Failed to close transport");
        }

        let unmatched = self.correlator.clear();
        if !unmatched.is_empty() {
            debug!(count = unmatched.len(), ids = ?unmatched, "Discarding unmatched tool calls");
        }

        let result = std::mem::take(&mut self.accumulator);
        match outcome {
            Ok(()) => {
                self.state = StreamState::Completed;
                info!(
                    provider = %provider,
                    content_len = result.content.len(),
                    tool_calls = result.tool_calls.len(),
                    "Stream completed"
                );
                Ok(result)
            }
            Err(e) => {
                self.state = StreamState::Failed;
                if e.is_disconnect() {
                    warn!(provider = %provider, error = %e, "Stream interrupted");
                } else {
                    error!(
                        provider = %provider,
                        error = %e,
                        context = e.context().unwrap_or("-"),
                        "Stream failed"
                    );
                }
                Err(StreamFailure {
                    error: e,
                    partial: result,
                })
            }
        }
    }

    async fn drive(
        &mut self,
        mut events: NativeEventStream,
        transport: &mut dyn ChunkTransport,
    ) -> GatewayResult<()> {
        transport.open().await?;
        transport.send(&StreamChunk::Start).await?;

        loop {
            let next = match &self.cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(GatewayError::Cancelled),
                    next = events.next() => next,
                },
                None => events.next().await,
            };
            let Some(event) = next else {
                return Ok(());
            };

            for chunk in self.adapter.translate_all(event?) {
                match chunk {
                    // Already emitted on entry
                    StreamChunk::Start => {}
                    StreamChunk::Done => return Ok(()),
                    StreamChunk::Error { message } => {
                        return Err(GatewayError::provider_named(
                            message,
                            self.adapter.provider(),
                        ));
                    }
                    chunk => {
                        if let Some(chunk) = self.absorb(chunk) {
                            transport.send(&chunk).await?;
                        }
                    }
                }
            }
        }
    }

    /// Fold a chunk into the accumulator, returning what to send
    ///
    /// A matched `tool_result` is completed with the name and final
    /// arguments of its call. An unmatched one is dropped, so every result
    /// on the wire follows its call.
    fn absorb(&mut self, chunk: StreamChunk) -> Option<StreamChunk> {
        match chunk {
            StreamChunk::Content { ref text } => self.accumulator.push_text(text),
            StreamChunk::Reasoning { ref text } => self.accumulator.push_reasoning(text),
            StreamChunk::ToolCall {
                ref call_id,
                ref name,
                ref arguments,
            } => self.correlator.observe_call(call_id, name, arguments.clone()),
            StreamChunk::ToolResult {
                call_id,
                name,
                arguments,
                result,
            } => {
                let Some(pending) = self.correlator.observe_result(&call_id) else {
                    debug!(call_id = %call_id, "Dropping tool result without a matching call");
                    return None;
                };
                let name = if pending.name.is_empty() { name } else { pending.name };
                let arguments = if pending.arguments.is_null() {
                    arguments
                } else {
                    pending.arguments
                };
                self.accumulator.push_tool_call(ToolCallRecord::new(
                    name.clone(),
                    arguments.clone(),
                    result.clone(),
                ));
                return Some(StreamChunk::ToolResult {
                    call_id,
                    name,
                    arguments,
                    result,
                });
            }
            StreamChunk::StepFinish {
                ref finish_reason,
                usage,
            } => self.accumulator.record_finish(finish_reason.clone(), usage),
            _ => {}
        }
        Some(chunk)
    }
}
