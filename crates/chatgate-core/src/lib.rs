//! Chatgate Core Library
//!
//! Admission control and streaming completion plumbing for a multi-turn
//! chat service: tiered fixed-window rate limiting, translation of model
//! backend event streams into one wire protocol, tool-call correlation, and
//! the strategies that turn a completion into exactly one persisted reply.

pub mod config;
pub mod error;
pub mod llm;
pub mod rate_limit;
pub mod types;

// Re-export commonly used types
pub use config::{ChatConfig, Config, ConfigLoader, RateLimitSettings, WireFormat};
pub use error::{GatewayError, GatewayResult, UnifiedError};
pub use llm::{
    AccumulatedResult, ChatMessage, ChatProvider, ChunkTransport, CompletedMessage,
    CompletionOptions, NativeEvent, Reply, ResponseStrategySelector, StreamChunk,
    StreamEventAdapter, StreamFailure, StreamingOrchestrator, ToolCallCorrelator,
};
pub use rate_limit::{RateLimitHeaders, RateLimitTier, TieredRateLimiter, WindowedCounterStore};
pub use types::RequestContext;
