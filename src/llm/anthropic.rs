//! Anthropic Messages API client
//!
//! Sends requests in the internal message format (which already matches the
//! Anthropic wire format) and parses streaming responses from server-sent
//! events.
//!
//! ```ignore
//! let llm = AnthropicProvider::from_env("claude-3-5-sonnet-20240620")?;
//! let response = llm.send(ChatRequest { messages: vec![Message::user("Hi")], ..Default::default() }).await?;
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::env;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use super::provider::{EventStream, LlmProvider};
use super::types::{ChatRequest, Message, MessageResponse, StreamEvent, ToolDefinition};
use crate::error::BespokenError;

const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

/// Anthropic LLM provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    api_base: String,
}

impl AnthropicProvider {
    /// Create a provider from environment variables
    ///
    /// Reads from:
    /// - `ANTHROPIC_API_KEY` (required)
    /// - `ANTHROPIC_BASE_URL` (optional, defaults to the Anthropic API)
    /// - `ANTHROPIC_MAX_TOKENS` (optional, defaults to 4096)
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        tracing::info!("Creating Anthropic provider from environment");

        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| BespokenError::MissingApiKey {
            var: "ANTHROPIC_API_KEY",
        })?;

        let mut provider = Self::new(api_key, model);

        if let Ok(url) = env::var("ANTHROPIC_BASE_URL") {
            tracing::info!("Using custom base URL: {}", url);
            provider = provider.with_base_url(url);
        }

        if let Some(max_tokens) = env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            provider = provider.with_max_tokens(max_tokens);
        }

        tracing::info!("Using model: {}", provider.model);
        Ok(provider)
    }

    /// Create a provider with an explicit API key
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Override the API base URL (e.g. a proxy or a test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request<'a>(&'a self, request: &'a ChatRequest, stream: bool) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: request.system.as_deref(),
            messages: &request.messages,
            tools: &request.tools,
            stream,
        }
    }

    async fn post(&self, body: &AnthropicRequest<'_>) -> Result<reqwest::Response> {
        let url = format!("{}/messages", self.api_base);

        let request_json =
            serde_json::to_string(body).context("Failed to serialize Anthropic request")?;
        tracing::debug!("[Anthropic] Request JSON: {}", request_json);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .body(request_json)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            tracing::error!("[Anthropic] API error: {} - {}", status, error_text);
            return Err(BespokenError::Api {
                provider: "anthropic",
                status: status.as_u16(),
                body: error_text,
            }
            .into());
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn model(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn send(&self, request: ChatRequest) -> Result<MessageResponse> {
        tracing::info!("[Anthropic] Sending message");
        tracing::debug!("[Anthropic] Messages count: {}", request.messages.len());

        let body = self.build_request(&request, false);
        let response = self.post(&body).await?;
        let text = response
            .text()
            .await
            .context("Failed to read Anthropic response body")?;
        tracing::debug!("[Anthropic] Response body: {}", text);

        serde_json::from_str(&text).context("Failed to parse Anthropic API response")
    }

    async fn stream(&self, request: ChatRequest) -> Result<EventStream> {
        tracing::info!("[Anthropic] Streaming message");
        tracing::debug!("[Anthropic] Messages count: {}", request.messages.len());
        tracing::debug!("[Anthropic] Tools count: {}", request.tools.len());

        let body = self.build_request(&request, true);
        let response = self.post(&body).await?;

        tracing::info!("[Anthropic] Streaming response started");

        // Parse the SSE byte stream line by line
        let byte_stream = response.bytes_stream();
        let stream_reader = StreamReader::new(
            byte_stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string()))),
        );
        let buf_reader = tokio::io::BufReader::new(stream_reader);

        let stream = async_stream::try_stream! {
            let mut lines = buf_reader.lines();
            let mut event_count: usize = 0;

            while let Some(line) = lines.next_line().await? {
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data.is_empty() {
                    continue;
                }

                let event: StreamEvent = match serde_json::from_str(data) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!("[Anthropic] Failed to parse stream event: {} ({})", e, data);
                        continue;
                    }
                };
                event_count += 1;

                let done = matches!(event, StreamEvent::MessageStop);
                yield event;
                if done {
                    break;
                }
            }

            tracing::info!("[Anthropic] Stream ended after {} events", event_count);
        };

        Ok(Box::pin(stream))
    }
}
