//! OpenAI-compatible chat completions client

use super::error_utils::handle_http_error;
use crate::config::ProviderConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::llm::adapters::{OpenAiAdapter, StreamEventAdapter, parse_usage};
use crate::llm::messages::{ChatMessage, CompletedMessage, CompletionOptions};
use crate::llm::native::{NativeEventStream, decode_sse_stream};
use crate::llm::provider::ChatProvider;
use async_trait::async_trait;
use chatgate_session::Role;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::instrument;

pub struct OpenAiProvider {
    config: ProviderConfig,
    http_client: Client,
}

impl OpenAiProvider {
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
        let turns: Vec<Value> = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::Assistant => "assistant",
                    Role::User | Role::Tool => "user",
                };
                json!({"role": role, "content": m.content})
            })
            .collect();

        let mut body = json!({
            "model": options.model.as_deref().unwrap_or(&self.config.model),
            "max_tokens": options.max_tokens.unwrap_or(self.config.max_tokens),
            "messages": turns,
        });
        if let Some(temperature) = options.temperature.or(self.config.temperature) {
            body["temperature"] = json!(temperature);
        }
        if !options.tools.is_empty() {
            body["tools"] = json!(options.tools);
        }
        if stream {
            body["stream"] = json!(true);
            body["stream_options"] = json!({"include_usage": true});
        }
        body
    }

    async fn send(&self, body: &Value) -> GatewayResult<reqwest::Response> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());
        let mut request = self.http_client.post(&url).json(body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            GatewayError::provider_named(format!("OpenAI request failed: {}", e), "openai")
                .with_context("Failed to send HTTP request to OpenAI API")
        })?;

        if !response.status().is_success() {
            return Err(handle_http_error(response, "OpenAI").await);
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn adapter(&self) -> Box<dyn StreamEventAdapter> {
        Box::new(OpenAiAdapter::new())
    }

    #[instrument(skip(self, messages, options), level = "debug")]
    async fn stream(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> GatewayResult<NativeEventStream> {
        let body = self.request_body(messages, options, true);
        let response = self.send(&body).await?;
        Ok(decode_sse_stream(response.bytes_stream(), "openai"))
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

/// Fold a chat completion body into a completed reply
///
/// Requested tool calls carry no result in this API, so none are kept.
pub(crate) fn parse_response(json: &Value) -> GatewayResult<CompletedMessage> {
    let choice = json["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or_else(|| GatewayError::provider_named("Response has no choices", "openai"))?;
    let message = &choice["message"];

    if let Some(calls) = message["tool_calls"].as_array().filter(|c| !c.is_empty()) {
        tracing::debug!(count = calls.len(), "Tool calls requested without results");
    }

    Ok(CompletedMessage {
        content: message["content"].as_str().unwrap_or_default().to_string(),
        reasoning: message["reasoning_content"].as_str().map(String::from),
        tool_calls: Vec::new(),
        finish_reason: choice["finish_reason"].as_str().map(String::from),
        usage: parse_usage(&json["usage"]),
    })
}
