//! Assembles a streamed reply for persistence

use super::messages::CompletedMessage;
use chatgate_session::{TokenUsage, ToolCallRecord};

/// Text and finalized tool calls gathered over one stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatedResult {
    pub content: String,
    pub reasoning: String,
    /// Only calls whose result was matched, in match order
    pub tool_calls: Vec<ToolCallRecord>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl AccumulatedResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, text: &str) {
        self.content.push_str(text);
    }

    pub fn push_reasoning(&mut self, text: &str) {
        self.reasoning.push_str(text);
    }

    pub fn push_tool_call(&mut self, record: ToolCallRecord) {
        self.tool_calls.push(record);
    }

    /// Keep the latest reported finish reason and usage
    pub fn record_finish(&mut self, finish_reason: Option<String>, usage: Option<TokenUsage>) {
        if finish_reason.is_some() {
            self.finish_reason = finish_reason;
        }
        if usage.is_some() {
            self.usage = usage;
        }
    }

    pub fn has_output(&self) -> bool {
        !self.content.is_empty() || !self.tool_calls.is_empty()
    }

    pub fn into_completed(self) -> CompletedMessage {
        CompletedMessage {
            content: self.content,
            reasoning: (!self.reasoning.is_empty()).then_some(self.reasoning),
            tool_calls: self.tool_calls,
            finish_reason: self.finish_reason,
            usage: self.usage,
        }
    }
}

impl From<AccumulatedResult> for CompletedMessage {
    fn from(result: AccumulatedResult) -> Self {
        result.into_completed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_finish_keeps_latest_values() {
        let mut result = AccumulatedResult::new();
        result.record_finish(Some("stop".into()), None);
        result.record_finish(None, Some(TokenUsage::new(1, 2)));

        assert_eq!(result.finish_reason.as_deref(), Some("stop"));
        assert_eq!(result.usage, Some(TokenUsage::new(1, 2)));
    }

    #[test]
    fn test_into_completed() {
        let mut result = AccumulatedResult::new();
        assert!(!result.has_output());
        result.push_text("a");
        result.push_text("b");
        result.push_tool_call(ToolCallRecord::new("f", json!({}), json!("r")));

        let completed = result.into_completed();
        assert_eq!(completed.content, "ab");
        assert_eq!(completed.reasoning, None);
        assert_eq!(completed.tool_calls.len(), 1);
    }
}
