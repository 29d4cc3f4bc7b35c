//! Anthropic Messages API client

use super::error_utils::handle_http_error;
use crate::config::ProviderConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::llm::adapters::{AnthropicAdapter, StreamEventAdapter, parse_usage};
use crate::llm::correlator::ToolCallCorrelator;
use crate::llm::messages::{ChatMessage, CompletedMessage, CompletionOptions};
use crate::llm::native::{NativeEventStream, decode_sse_stream};
use crate::llm::provider::ChatProvider;
use async_trait::async_trait;
use chatgate_session::Role;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::instrument;

const DEFAULT_API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    config: ProviderConfig,
    http_client: Client,
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> GatewayResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(config, http_client))
    }

    pub fn with_client(config: ProviderConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn request_body(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
        stream: bool,
    ) -> Value {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let turns: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                };
                json!({"role": role, "content": m.content})
            })
            .collect();

        let mut body = json!({
            "model": options.model.as_deref().unwrap_or(&self.config.model),
            "max_tokens": options.max_tokens.unwrap_or(self.config.max_tokens),
            "messages": turns,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }
        if let Some(temperature) = options.temperature.or(self.config.temperature) {
            body["temperature"] = json!(temperature);
        }
        if !options.tools.is_empty() {
            body["tools"] = json!(options.tools);
        }
        if stream {
            body["stream"] = json!(true);
        }
        body
    }

    async fn send(&self, body: &Value) -> GatewayResult<reqwest::Response> {
        let url = format!("{}/v1/messages", self.config.base_url());
        let mut request = self
            .http_client
            .post(&url)
            .header(
                "anthropic-version",
                self.config
                    .api_version
                    .as_deref()
                    .unwrap_or(DEFAULT_API_VERSION),
            )
            .json(body);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await.map_err(|e| {
            GatewayError::provider_named(format!("Anthropic request failed: {}", e), "anthropic")
                .with_context("Failed to send HTTP request to Anthropic API")
        })?;

        if !response.status().is_success() {
            return Err(handle_http_error(response, "Anthropic").await);
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn adapter(&self) -> Box<dyn StreamEventAdapter> {
        Box::new(AnthropicAdapter::new())
    }

    #[instrument(skip(self, messages, options), level = "debug")]
    async fn stream(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> GatewayResult<NativeEventStream> {
        let body = self.request_body(messages, options, true);
        let response = self.send(&body).await?;
        Ok(decode_sse_stream(response.bytes_stream(), "anthropic"))
    }

    #[instrument(skip(self, messages, options), level = "debug")]
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> GatewayResult<CompletedMessage> {
        let body = self.request_body(messages, options, false);
        let response = self.send(&body).await?;
        let json: Value = response.json().await?;
        parse_response(&json)
    }
}

/// Fold a Messages API response body into a completed reply
///
/// Tool calls are only kept when the same response carries their result,
/// which is the case for server-side tools.
pub(crate) fn parse_response(json: &Value) -> GatewayResult<CompletedMessage> {
    let blocks = json["content"].as_array().ok_or_else(|| {
        GatewayError::provider_named("Response has no content array", "anthropic")
    })?;

    let mut completed = CompletedMessage::default();
    let mut reasoning = String::new();
    let mut correlator = ToolCallCorrelator::new();

    for block in blocks {
        match block["type"].as_str().unwrap_or_default() {
            "text" => completed
                .content
                .push_str(block["text"].as_str().unwrap_or_default()),
            "thinking" => reasoning.push_str(block["thinking"].as_str().unwrap_or_default()),
            "tool_use" | "server_tool_use" => correlator.observe_call(
                block["id"].as_str().unwrap_or_default(),
                block["name"].as_str().unwrap_or_default(),
                block["input"].clone(),
            ),
            kind if kind.ends_with("tool_result") => {
                let call_id = block["tool_use_id"].as_str().unwrap_or_default();
                if let Some(call) = correlator.observe_result(call_id) {
                    completed
                        .tool_calls
                        .push(call.into_record(block["content"].clone()));
                }
            }
            _ => {}
        }
    }

    completed.reasoning = (!reasoning.is_empty()).then_some(reasoning);
    completed.finish_reason = json["stop_reason"].as_str().map(String::from);
    completed.usage = parse_usage(&json["usage"]);
    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgate_session::TokenUsage;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(ProviderConfig::default()).unwrap()
    }

    #[test]
    fn test_request_body_extracts_system() {
        let body = provider().request_body(
            &[
                ChatMessage::system("be brief"),
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello"),
            ],
            &CompletionOptions::default().with_max_tokens(64),
            true,
        );

        assert_eq!(body["system"], "be brief");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_response_pairs_server_tools() {
        let completed = parse_response(&json!({
            "content": [
                {"type": "text", "text": "Looking. "},
                {"type": "server_tool_use", "id": "s1", "name": "web_search", "input": {"query": "x"}},
                {"type": "web_search_tool_result", "tool_use_id": "s1", "content": [{"url": "u"}]},
                {"type": "tool_use", "id": "c1", "name": "client_tool", "input": {}},
                {"type": "text", "text": "Done."}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 5, "output_tokens": 7}
        }))
        .unwrap();

        assert_eq!(completed.content, "Looking. Done.");
        assert_eq!(completed.tool_calls.len(), 1);
        assert_eq!(completed.tool_calls[0].name, "web_search");
        assert_eq!(completed.finish_reason.as_deref(), Some("tool_use"));
        assert_eq!(completed.usage, Some(TokenUsage::new(5, 7)));
    }

    #[test]
    fn test_parse_response_clamps_oversized_usage() {
        let completed = parse_response(&json!({
            "content": [{"type": "text", "text": "ok"}],
            "usage": {"input_tokens": 5_000_000_000u64, "output_tokens": 3}
        }))
        .unwrap();

        assert_eq!(completed.usage, Some(TokenUsage::new(u32::MAX, 3)));
    }

    #[test]
    fn test_parse_response_rejects_missing_content() {
        assert!(parse_response(&json!({"type": "error"})).is_err());
    }
}
