//! Message data structures
//!
//! Defines the persisted shape of a conversation turn:
//! - Message: one stored turn with its metadata
//! - ToolCallRecord: a finalized tool invocation with its result
//! - TokenUsage: provider-reported token accounting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
    /// Tool output fed back to the model
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// Token usage reported by the model backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// A tool invocation paired with its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Tool name
    pub name: String,

    /// Arguments the model supplied
    pub arguments: serde_json::Value,

    /// Result the tool produced
    pub result: serde_json::Value,
}

impl ToolCallRecord {
    pub fn new(
        name: impl Into<String>,
        arguments: serde_json::Value,
        result: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            arguments,
            result,
        }
    }
}

/// Metadata attached to a stored message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Finalized tool calls (assistant only)
    #[serde(default, rename = "toolCalls", skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRecord>>,

    /// Why the model stopped generating
    #[serde(default, rename = "finishReason", skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self.tool_calls.is_none() && self.finish_reason.is_none() && self.usage.is_none()
    }
}

/// A persisted conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: String,

    /// Conversation this message belongs to
    #[serde(rename = "chatId")]
    pub chat_id: String,

    pub role: Role,

    pub content: String,

    #[serde(default, skip_serializing_if = "MessageMetadata::is_empty")]
    pub metadata: MessageMetadata,

    /// Creation timestamp
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with a generated ID
    pub fn new(chat_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            role,
            content: content.into(),
            metadata: MessageMetadata::default(),
            created_at: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(chat_id, Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(chat_id, Role::Assistant, content)
    }

    /// Create a new system message
    pub fn system(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(chat_id, Role::System, content)
    }

    /// Attach finalized tool calls; an empty list leaves the field unset
    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRecord>) -> Self {
        self.metadata.tool_calls = if calls.is_empty() { None } else { Some(calls) };
        self
    }

    pub fn with_finish_reason(mut self, reason: Option<String>) -> Self {
        self.metadata.finish_reason = reason;
        self
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.metadata.usage = usage;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assistant_message_serialization() {
        let message = Message::assistant("chat-1", "hello").with_tool_calls(vec![
            ToolCallRecord::new("lookup", json!({"q": "rust"}), json!("found")),
        ]);

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["chatId"], "chat-1");
        assert_eq!(value["metadata"]["toolCalls"][0]["name"], "lookup");
        assert_eq!(value["metadata"]["toolCalls"][0]["result"], "found");
    }

    #[test]
    fn test_empty_metadata_is_omitted() {
        let message = Message::user("chat-1", "hi").with_tool_calls(Vec::new());
        assert!(message.metadata.tool_calls.is_none());

        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("metadata").is_none());

        let back: Message = serde_json::from_value(value).unwrap();
        assert!(back.metadata.is_empty());
    }

    #[test]
    fn test_usage_total_saturates() {
        let usage = TokenUsage::new(u32::MAX, 5);
        assert_eq!(usage.total(), u32::MAX);
    }
}
