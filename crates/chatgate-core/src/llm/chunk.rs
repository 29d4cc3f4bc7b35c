//! Canonical streaming protocol

use crate::config::WireFormat;
use crate::error::GatewayResult;
use chatgate_session::TokenUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of the client-facing stream
///
/// `Start` is always first and `Done` or `Error` always last. A `ToolCall`
/// for an id precedes the `ToolResult` carrying the same id; a result with
/// no earlier call is never sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    Start,
    Content {
        text: String,
    },
    Reasoning {
        text: String,
    },
    /// A complete call or one fragment of its arguments
    ToolCall {
        #[serde(rename = "callId")]
        call_id: String,
        name: String,
        arguments: Value,
    },
    ToolResult {
        #[serde(rename = "callId")]
        call_id: String,
        name: String,
        arguments: Value,
        result: Value,
    },
    StepStart {
        #[serde(rename = "stepKind", default, skip_serializing_if = "Option::is_none")]
        step_kind: Option<String>,
    },
    StepFinish {
        #[serde(rename = "finishReason", default, skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<TokenUsage>,
    },
    Done,
    Error {
        message: String,
    },
}

impl StreamChunk {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning { text: text.into() }
    }

    pub fn tool_call(call_id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self::ToolCall {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: Value,
        result: Value,
    ) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
            result,
        }
    }

    pub fn step_start(step_kind: Option<String>) -> Self {
        Self::StepStart { step_kind }
    }

    pub fn step_finish(finish_reason: Option<String>, usage: Option<TokenUsage>) -> Self {
        Self::StepFinish {
            finish_reason,
            usage,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Wire name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Content { .. } => "content",
            Self::Reasoning { .. } => "reasoning",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::StepStart { .. } => "step_start",
            Self::StepFinish { .. } => "step_finish",
            Self::Done => "done",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }

    pub fn to_json(&self) -> GatewayResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Frame this chunk for the wire
    pub fn encode(&self, format: WireFormat) -> GatewayResult<String> {
        let json = self.to_json()?;
        Ok(match format {
            WireFormat::Sse => format!("data: {}\n\n", json),
            WireFormat::Ndjson => format!("{}\n", json),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chunks_are_tagged_by_type() {
        let value = serde_json::to_value(StreamChunk::tool_call("1", "f", json!({"q": 1}))).unwrap();
        assert_eq!(
            value,
            json!({"type": "tool_call", "callId": "1", "name": "f", "arguments": {"q": 1}})
        );

        let value = serde_json::to_value(StreamChunk::step_finish(
            Some("stop".into()),
            Some(TokenUsage::new(3, 4)),
        ))
        .unwrap();
        assert_eq!(value["type"], "step_finish");
        assert_eq!(value["finishReason"], "stop");
        assert_eq!(value["usage"]["output_tokens"], 4);

        assert_eq!(serde_json::to_value(StreamChunk::Done).unwrap(), json!({"type": "done"}));
    }

    #[test]
    fn test_framing() {
        let chunk = StreamChunk::content("hi");
        assert_eq!(
            chunk.encode(WireFormat::Sse).unwrap(),
            "data: {\"type\":\"content\",\"text\":\"hi\"}\n\n"
        );
        assert_eq!(
            chunk.encode(WireFormat::Ndjson).unwrap(),
            "{\"type\":\"content\",\"text\":\"hi\"}\n"
        );
    }

    #[test]
    fn test_parse_from_wire() {
        let chunk: StreamChunk = serde_json::from_str(r#"{"type":"step_start"}"#).unwrap();
        assert_eq!(chunk, StreamChunk::step_start(None));
        assert!(StreamChunk::error("x").is_terminal());
        assert!(!StreamChunk::Start.is_terminal());
    }
}
