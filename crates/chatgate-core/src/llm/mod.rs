//! Streaming completion plumbing
//!
//! Provider bytes flow through `SseDecoder` into `NativeEvent`s, a
//! per-provider `StreamEventAdapter` turns those into `StreamChunk`s, and
//! the `StreamingOrchestrator` writes each chunk to a `ChunkTransport` while
//! accumulating the reply. `ResponseStrategySelector` decides per call
//! whether to stream at all.

pub mod accumulator;
pub mod adapters;
pub mod chunk;
pub mod correlator;
pub mod messages;
pub mod native;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod sse_decoder;
pub mod strategy;
pub mod transport;

pub use accumulator::AccumulatedResult;
pub use adapters::{
    AdapterKind, AnthropicAdapter, OpenAiAdapter, PartStreamAdapter, StreamEventAdapter,
};
pub use chunk::StreamChunk;
pub use correlator::{PendingToolCall, ToolCallCorrelator};
pub use messages::{ChatMessage, CompletedMessage, CompletionOptions};
pub use native::{NativeEvent, NativeEventStream, decode_sse_stream};
pub use orchestrator::{StreamFailure, StreamState, StreamingOrchestrator};
pub use provider::ChatProvider;
pub use providers::{AnthropicProvider, OpenAiProvider, ReplayProvider, build_provider};
pub use sse_decoder::{SseDecoder, SseEvent};
pub use strategy::{
    BlockingStrategy, ChatRequest, Reply, ResponseStrategy, ResponseStrategySelector,
    StreamingStrategy,
};
pub use transport::{ChannelTransport, ChunkTransport, RecordingTransport, SseTransport};
