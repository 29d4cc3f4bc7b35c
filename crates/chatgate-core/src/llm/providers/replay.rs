//! Replays a recorded provider stream

use crate::error::{GatewayError, GatewayResult};
use crate::llm::adapters::{AdapterKind, StreamEventAdapter};
use crate::llm::messages::{ChatMessage, CompletedMessage, CompletionOptions};
use crate::llm::native::{NativeEvent, NativeEventStream, decode_sse_stream};
use crate::llm::orchestrator::StreamingOrchestrator;
use crate::llm::provider::ChatProvider;
use crate::llm::transport::RecordingTransport;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;

/// Size of the simulated network reads
const READ_SIZE: usize = 256;

/// Serves a captured stream instead of calling a backend
///
/// Captures are either raw SSE (`event:`/`data:` blocks) or JSON lines with
/// one event payload per line.
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    capture: Vec<u8>,
    kind: AdapterKind,
    delay: Option<Duration>,
}

impl ReplayProvider {
    pub fn new(capture: impl Into<Vec<u8>>, kind: AdapterKind) -> Self {
        Self {
            capture: capture.into(),
            kind,
            delay: None,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>, kind: AdapterKind) -> GatewayResult<Self> {
        let path = path.as_ref();
        let capture = tokio::fs::read(path).await.map_err(|e| {
            GatewayError::invalid_input_field(
                format!("Cannot read capture: {}", e),
                path.display().to_string(),
            )
        })?;
        Ok(Self::new(capture, kind))
    }

    /// Pause between events, to mimic a live backend
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn is_json_lines(&self) -> bool {
        String::from_utf8_lossy(&self.capture)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .is_some_and(|line| line.starts_with('{'))
    }

    fn events(&self) -> NativeEventStream {
        let events: NativeEventStream = if self.is_json_lines() {
            let parsed: Vec<GatewayResult<NativeEvent>> = String::from_utf8_lossy(&self.capture)
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| {
                    serde_json::from_str(line)
                        .map(NativeEvent::data_only)
                        .map_err(GatewayError::from)
                })
                .collect();
            Box::pin(futures::stream::iter(parsed))
        } else {
            let reads: Vec<Result<Vec<u8>, std::convert::Infallible>> = self
                .capture
                .chunks(READ_SIZE)
                .map(|read| Ok(read.to_vec()))
                .collect();
            decode_sse_stream(futures::stream::iter(reads), "replay")
        };

        match self.delay {
            Some(delay) => Box::pin(events.then(move |event| async move {
                tokio::time::sleep(delay).await;
                event
            })),
            None => events,
        }
    }
}

#[async_trait]
impl ChatProvider for ReplayProvider {
    fn name(&self) -> &str {
        "replay"
    }

    fn adapter(&self) -> Box<dyn StreamEventAdapter> {
        self.kind.build()
    }

    async fn stream(
        &self,
        _messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> GatewayResult<NativeEventStream> {
        Ok(self.events())
    }

    /// Collapse the capture into one reply without a client transport
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> GatewayResult<CompletedMessage> {
        let mut sink = RecordingTransport::new();
        StreamingOrchestrator::new(self.adapter())
            .run(self.events(), &mut sink)
            .await
            .map(CompletedMessage::from)
            .map_err(|failure| failure.error)
    }
}
