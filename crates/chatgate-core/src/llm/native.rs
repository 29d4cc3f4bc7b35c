//! Provider-native events before translation

use super::sse_decoder::{SseDecoder, SseEvent};
use crate::error::{GatewayError, GatewayResult};
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

/// One event as the model backend emitted it
///
/// The payload is kept as untyped JSON; only the matching
/// `StreamEventAdapter` knows its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvent {
    /// SSE `event:` name, when the provider sends one
    pub event_type: Option<String>,
    pub data: Value,
}

impl NativeEvent {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: Some(event_type.into()),
            data,
        }
    }

    pub fn data_only(data: Value) -> Self {
        Self {
            event_type: None,
            data,
        }
    }

    /// Event name, falling back to the payload's `type` field
    pub fn kind(&self) -> Option<&str> {
        self.event_type
            .as_deref()
            .or_else(|| self.data.get("type").and_then(Value::as_str))
    }

    /// Whether this is the OpenAI-style `[DONE]` sentinel
    pub fn is_done_marker(&self) -> bool {
        self.data.as_str() == Some("[DONE]")
    }

    /// Convert a decoded SSE frame; frames whose data is not JSON are dropped
    pub fn from_sse(event: &SseEvent) -> Option<Self> {
        if event.is_done() {
            return Some(Self {
                event_type: event.event_type.clone(),
                data: Value::String("[DONE]".to_string()),
            });
        }

        match serde_json::from_str(&event.data) {
            Ok(data) => Some(Self {
                event_type: event.event_type.clone(),
                data,
            }),
            Err(e) => {
                tracing::warn!(
                    event_type = event.event_type.as_deref().unwrap_or("-"),
                    error = %e,
                    "Skipping non-JSON SSE event"
                );
                None
            }
        }
    }
}

/// Stream of native events from one completion request
pub type NativeEventStream = Pin<Box<dyn Stream<Item = GatewayResult<NativeEvent>> + Send>>;

struct DecodeState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    ready: VecDeque<GatewayResult<NativeEvent>>,
    provider: String,
    finished: bool,
}

impl<S> DecodeState<S> {
    fn push_events(&mut self, events: Vec<SseEvent>) {
        self.ready.extend(events.iter().filter_map(NativeEvent::from_sse).map(Ok));
    }
}

/// Decode an SSE byte stream into native events
///
/// A read error ends the stream after being yielded once. An event left
/// unterminated at end of input is still delivered.
pub fn decode_sse_stream<S, B, E>(bytes: S, provider: &str) -> NativeEventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        provider: provider.to_string(),
        finished: false,
    };

    let stream = futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(chunk.as_ref());
                    state.push_events(events);
                }
                Some(Err(e)) => {
                    state.ready.push_back(Err(GatewayError::provider_named(
                        format!("Stream error: {}", e),
                        state.provider.clone(),
                    )));
                    state.finished = true;
                }
                None => {
                    let tail = state.decoder.finish().into_iter().collect();
                    state.push_events(tail);
                    state.finished = true;
                }
            }
        }
    });

    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_falls_back_to_payload_type() {
        let event = NativeEvent::data_only(json!({"type": "text-delta", "text": "x"}));
        assert_eq!(event.kind(), Some("text-delta"));

        let event = NativeEvent::new("message_stop", json!({"type": "other"}));
        assert_eq!(event.kind(), Some("message_stop"));
    }

    #[test]
    fn test_from_sse() {
        let done = NativeEvent::from_sse(&SseEvent::new("[DONE]")).unwrap();
        assert!(done.is_done_marker());

        assert!(NativeEvent::from_sse(&SseEvent::new("not json")).is_none());
    }

    #[tokio::test]
    async fn test_decode_split_stream_with_error() {
        let reads: Vec<Result<&'static [u8], String>> = vec![
            Ok(b"event: a\ndata: {\"n\":".as_slice()),
            Ok(b"1}\n\ndata: {\"n\":2}".as_slice()),
            Err("connection reset".to_string()),
        ];
        let mut stream = decode_sse_stream(futures::stream::iter(reads), "test");

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, NativeEvent::new("a", json!({"n": 1})));

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_decode_flushes_tail() {
        let reads: Vec<Result<&'static [u8], String>> = vec![Ok(b"data: {\"n\":1}\n\ndata: {\"n\":2}".as_slice())];
        let events: Vec<_> = decode_sse_stream(futures::stream::iter(reads), "test")
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].as_ref().unwrap().data, json!({"n": 2}));
    }
}
