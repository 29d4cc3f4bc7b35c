//! Provider event translation
//!
//! Each adapter maps one backend's native event vocabulary onto
//! `StreamChunk`. Adapters keep per-stream state (open content blocks,
//! fragment indices), so a fresh one is built for every stream.

mod anthropic;
mod openai;
mod part_stream;

pub use anthropic::AnthropicAdapter;
pub use openai::OpenAiAdapter;
pub use part_stream::PartStreamAdapter;

use super::chunk::StreamChunk;
use super::native::NativeEvent;
use chatgate_session::TokenUsage;
use serde_json::Value;

/// Translates native provider events into canonical chunks
pub trait StreamEventAdapter: Send {
    /// Provider name used in logs and errors
    fn provider(&self) -> &str;

    /// Translate one event, or `None` for bookkeeping events with no
    /// canonical equivalent
    fn translate(&mut self, event: NativeEvent) -> Option<StreamChunk>;

    /// Chunks left over when a single event produced more than one
    fn take_pending(&mut self) -> Option<StreamChunk> {
        None
    }

    /// Translate one event into every chunk it produces, in order
    fn translate_all(&mut self, event: NativeEvent) -> Vec<StreamChunk> {
        let mut chunks: Vec<StreamChunk> = self.translate(event).into_iter().collect();
        while let Some(chunk) = self.take_pending() {
            chunks.push(chunk);
        }
        chunks
    }
}

/// Which adapter a recorded or live stream needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Anthropic,
    OpenAi,
    Parts,
}

impl AdapterKind {
    pub fn build(&self) -> Box<dyn StreamEventAdapter> {
        match self {
            Self::Anthropic => Box::new(AnthropicAdapter::new()),
            Self::OpenAi => Box::new(OpenAiAdapter::new()),
            Self::Parts => Box::new(PartStreamAdapter::new()),
        }
    }
}

impl std::str::FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "parts" | "part-stream" => Ok(Self::Parts),
            other => Err(format!("unknown stream format '{}'", other)),
        }
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().map(|v| v.min(u32::MAX as u64) as u32)
}

/// Read usage from either `input_tokens`/`output_tokens` or the
/// `prompt_tokens`/`completion_tokens` naming
pub(crate) fn parse_usage(usage: &Value) -> Option<TokenUsage> {
    if !usage.is_object() {
        return None;
    }
    let input = ["input_tokens", "prompt_tokens", "inputTokens", "promptTokens"]
        .iter()
        .find_map(|k| as_u32(&usage[*k]));
    let output = [
        "output_tokens",
        "completion_tokens",
        "outputTokens",
        "completionTokens",
    ]
    .iter()
    .find_map(|k| as_u32(&usage[*k]));

    if input.is_none() && output.is_none() {
        return None;
    }
    Some(TokenUsage::new(input.unwrap_or(0), output.unwrap_or(0)))
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_usage_naming() {
        assert_eq!(
            parse_usage(&json!({"input_tokens": 3, "output_tokens": 5})),
            Some(TokenUsage::new(3, 5))
        );
        assert_eq!(
            parse_usage(&json!({"prompt_tokens": 1, "completion_tokens": 2})),
            Some(TokenUsage::new(1, 2))
        );
        assert_eq!(parse_usage(&json!({})), None);
        assert_eq!(parse_usage(&Value::Null), None);
    }

    #[test]
    fn test_adapter_kind_from_str() {
        assert_eq!("parts".parse::<AdapterKind>(), Ok(AdapterKind::Parts));
        assert!("gemini".parse::<AdapterKind>().is_err());
    }
}
