//! OpenAI-compatible chat-completions chunks
//!
//! Tool-call fragments are keyed by `index`; only the first fragment of a
//! call carries its `id` and function name, so both are remembered per
//! index for the rest of the stream.

use super::{StreamEventAdapter, non_empty_str, parse_usage};
use crate::llm::chunk::StreamChunk;
use crate::llm::native::NativeEvent;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
struct IndexedCall {
    id: String,
    name: String,
}

#[derive(Debug, Default)]
pub struct OpenAiAdapter {
    calls: HashMap<u64, IndexedCall>,
    started: bool,
    pending: VecDeque<StreamChunk>,
}

impl OpenAiAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn tool_fragment(&mut self, fragment: &Value) -> Option<StreamChunk> {
        let index = fragment["index"].as_u64().unwrap_or(0);
        let function = &fragment["function"];

        let call = self.calls.entry(index).or_insert_with(|| IndexedCall {
            id: String::new(),
            name: String::new(),
        });
        if let Some(id) = non_empty_str(&fragment["id"]) {
            call.id = id.to_string();
        }
        if let Some(name) = non_empty_str(&function["name"]) {
            call.name = name.to_string();
        }

        if call.id.is_empty() {
            tracing::debug!(index, "Tool call fragment before its id, dropping");
            return None;
        }

        let arguments = function["arguments"]
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Null);
        Some(StreamChunk::tool_call(call.id.clone(), call.name.clone(), arguments))
    }

    fn translate_choice(&mut self, choice: &Value, usage: &Value) {
        let delta = &choice["delta"];

        if !self.started && delta.get("role").is_some() {
            self.started = true;
            self.pending.push_back(StreamChunk::step_start(None));
        }
        if let Some(text) = non_empty_str(&delta["reasoning_content"]) {
            self.pending.push_back(StreamChunk::reasoning(text));
        }
        if let Some(text) = non_empty_str(&delta["content"]) {
            self.pending.push_back(StreamChunk::content(text));
        }
        if let Some(fragments) = delta["tool_calls"].as_array() {
            for fragment in fragments {
                if let Some(chunk) = self.tool_fragment(fragment) {
                    self.pending.push_back(chunk);
                }
            }
        }
        if let Some(reason) = choice["finish_reason"].as_str() {
            self.pending.push_back(StreamChunk::step_finish(
                Some(reason.to_string()),
                parse_usage(usage),
            ));
        }
    }
}

impl StreamEventAdapter for OpenAiAdapter {
    fn provider(&self) -> &str {
        "openai"
    }

    fn translate(&mut self, event: NativeEvent) -> Option<StreamChunk> {
        if event.is_done_marker() {
            return None;
        }
        let data = &event.data;

        if let Some(error) = data.get("error").filter(|e| !e.is_null()) {
            let message = error["message"]
                .as_str()
                .or_else(|| error.as_str())
                .unwrap_or("Unknown error");
            return Some(StreamChunk::error(message));
        }

        match data["choices"].as_array().and_then(|c| c.first()) {
            Some(choice) => self.translate_choice(choice, &data["usage"]),
            // Trailing usage-only chunk from `stream_options.include_usage`
            None => {
                if let Some(usage) = parse_usage(&data["usage"]) {
                    self.pending.push_back(StreamChunk::step_finish(None, Some(usage)));
                }
            }
        }

        self.pending.pop_front()
    }

    fn take_pending(&mut self) -> Option<StreamChunk> {
        self.pending.pop_front()
    }
}
