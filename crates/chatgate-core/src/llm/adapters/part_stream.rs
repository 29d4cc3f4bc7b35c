//! Kebab-case part streams from tool-executing runtimes
//!
//! These runtimes run tools themselves and report both the call and its
//! result inline, so `tool-result` parts arrive in the same stream as the
//! `tool-call` they answer.

use super::{StreamEventAdapter, parse_usage};
use crate::llm::chunk::StreamChunk;
use crate::llm::native::NativeEvent;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct PartStreamAdapter;

impl PartStreamAdapter {
    pub fn new() -> Self {
        Self
    }
}

/// First present field among the aliases a runtime version may use
fn field<'a>(data: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| data.get(*name))
        .find(|value| !value.is_null())
}

fn field_str(data: &Value, names: &[&str]) -> String {
    field(data, names)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl StreamEventAdapter for PartStreamAdapter {
    fn provider(&self) -> &str {
        "parts"
    }

    fn translate(&mut self, event: NativeEvent) -> Option<StreamChunk> {
        let kind = event.kind()?.to_string();
        let data = &event.data;

        let chunk = match kind.as_str() {
            "start" => StreamChunk::Start,
            "text-delta" | "text" => {
                let text = field_str(data, &["textDelta", "text", "delta"]);
                if text.is_empty() {
                    return None;
                }
                StreamChunk::content(text)
            }
            "reasoning" | "reasoning-delta" => {
                let text = field_str(data, &["textDelta", "text", "delta"]);
                if text.is_empty() {
                    return None;
                }
                StreamChunk::reasoning(text)
            }
            "tool-call" => StreamChunk::tool_call(
                field_str(data, &["toolCallId"]),
                field_str(data, &["toolName"]),
                field(data, &["args", "input"]).cloned().unwrap_or(Value::Null),
            ),
            "tool-call-delta" => StreamChunk::tool_call(
                field_str(data, &["toolCallId"]),
                field_str(data, &["toolName"]),
                Value::String(field_str(data, &["argsTextDelta", "inputTextDelta"])),
            ),
            "tool-result" => StreamChunk::tool_result(
                field_str(data, &["toolCallId"]),
                field_str(data, &["toolName"]),
                field(data, &["args", "input"]).cloned().unwrap_or(Value::Null),
                field(data, &["result", "output"]).cloned().unwrap_or(Value::Null),
            ),
            "step-start" | "start-step" => {
                StreamChunk::step_start(field(data, &["stepType", "stepKind"]).and_then(|v| {
                    v.as_str().map(String::from)
                }))
            }
            "step-finish" | "finish-step" | "finish" => StreamChunk::step_finish(
                field(data, &["finishReason"])
                    .and_then(Value::as_str)
                    .map(String::from),
                field(data, &["usage", "totalUsage"]).and_then(parse_usage),
            ),
            "done" => StreamChunk::Done,
            "error" => {
                let message = match field(data, &["error", "message"]) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other["message"]
                        .as_str()
                        .unwrap_or("Unknown error")
                        .to_string(),
                    None => "Unknown error".to_string(),
                };
                StreamChunk::error(message)
            }
            _ => return None,
        };
        Some(chunk)
    }
}
