//! Anthropic Messages API stream events
//!
//! ```text
//! message_start        -> step_start
//! content_block_start  -> content | tool_call | tool_result
//! content_block_delta  -> content | reasoning | tool_call fragment
//! message_delta        -> step_finish
//! error                -> error
//! ```
//! `ping`, `content_block_stop`, `message_stop` and signature deltas are
//! dropped.

use super::{StreamEventAdapter, non_empty_str, parse_usage};
use crate::llm::chunk::StreamChunk;
use crate::llm::native::NativeEvent;
use chatgate_session::TokenUsage;
use serde_json::Value;
use std::collections::HashMap;

/// A tool_use block that is still receiving argument fragments
#[derive(Debug, Clone)]
struct OpenToolBlock {
    id: String,
    name: String,
}

#[derive(Debug, Default)]
pub struct AnthropicAdapter {
    /// Open tool_use blocks by content block index
    tool_blocks: HashMap<u64, OpenToolBlock>,
    /// Input tokens reported by message_start
    input_tokens: u32,
}

impl AnthropicAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn block_start(&mut self, data: &Value) -> Option<StreamChunk> {
        let index = data["index"].as_u64().unwrap_or(0);
        let block = &data["content_block"];
        let block_type = block["type"].as_str()?;

        match block_type {
            "text" => non_empty_str(&block["text"]).map(StreamChunk::content),
            "thinking" => non_empty_str(&block["thinking"]).map(StreamChunk::reasoning),
            "tool_use" | "server_tool_use" => {
                let id = block["id"].as_str().unwrap_or_default().to_string();
                let name = block["name"].as_str().unwrap_or_default().to_string();
                self.tool_blocks.insert(
                    index,
                    OpenToolBlock {
                        id: id.clone(),
                        name: name.clone(),
                    },
                );
                let input = block.get("input").cloned().unwrap_or(Value::Null);
                Some(StreamChunk::tool_call(id, name, input))
            }
            kind if kind.ends_with("tool_result") => {
                let call_id = block["tool_use_id"].as_str().unwrap_or_default();
                let result = block.get("content").cloned().unwrap_or(Value::Null);
                Some(StreamChunk::tool_result(call_id, "", Value::Null, result))
            }
            _ => None,
        }
    }

    fn block_delta(&mut self, data: &Value) -> Option<StreamChunk> {
        let delta = &data["delta"];
        match delta["type"].as_str()? {
            "text_delta" => non_empty_str(&delta["text"]).map(StreamChunk::content),
            "thinking_delta" => non_empty_str(&delta["thinking"]).map(StreamChunk::reasoning),
            "input_json_delta" => {
                let index = data["index"].as_u64().unwrap_or(0);
                let fragment = non_empty_str(&delta["partial_json"])?;
                let Some(block) = self.tool_blocks.get(&index) else {
                    tracing::debug!(index, "Argument fragment for unknown tool block");
                    return None;
                };
                Some(StreamChunk::tool_call(
                    block.id.clone(),
                    block.name.clone(),
                    Value::String(fragment.to_string()),
                ))
            }
            _ => None,
        }
    }

    fn message_delta(&mut self, data: &Value) -> StreamChunk {
        let finish_reason = data["delta"]["stop_reason"].as_str().map(String::from);
        let usage = parse_usage(&data["usage"]).map(|usage| {
            let input = if data["usage"]["input_tokens"].is_u64() {
                usage.input_tokens
            } else {
                self.input_tokens
            };
            TokenUsage::new(input, usage.output_tokens)
        });
        StreamChunk::step_finish(finish_reason, usage)
    }
}

impl StreamEventAdapter for AnthropicAdapter {
    fn provider(&self) -> &str {
        "anthropic"
    }

    fn translate(&mut self, event: NativeEvent) -> Option<StreamChunk> {
        let kind = event.kind()?.to_string();
        let data = &event.data;

        match kind.as_str() {
            "message_start" => {
                if let Some(input) = data["message"]["usage"]["input_tokens"].as_u64() {
                    self.input_tokens = input.min(u32::MAX as u64) as u32;
                }
                Some(StreamChunk::step_start(None))
            }
            "content_block_start" => self.block_start(data),
            "content_block_delta" => self.block_delta(data),
            "content_block_stop" => {
                if let Some(index) = data["index"].as_u64() {
                    self.tool_blocks.remove(&index);
                }
                None
            }
            "message_delta" => Some(self.message_delta(data)),
            "error" => {
                let message = data["error"]["message"]
                    .as_str()
                    .unwrap_or("Unknown error");
                Some(StreamChunk::error(message))
            }
            _ => None,
        }
    }
}
