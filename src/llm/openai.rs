//! OpenAI API client
//!
//! This module provides a direct HTTP client for the OpenAI Chat Completions API,
//! translating between the internal message types (Anthropic format)
//! and the OpenAI API format.
//!
//! # Authentication
//!
//! Uses an OpenAI API key (set via `OPENAI_API_KEY` environment variable or passed directly).
//!
//! ```ignore
//! // From environment variable
//! let llm = OpenAiProvider::from_env("gpt-4o-mini")?;
//!
//! // With explicit API key
//! let llm = OpenAiProvider::new("sk-...", "gpt-4o-mini");
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;

use super::provider::LlmProvider;
use super::types::{
    ChatRequest, ContentBlock, Message, MessageContent, MessageResponse, StopReason,
    ToolDefinition, Usage,
};
use crate::error::BespokenError;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MAX_TOKENS: u32 = 4096;

// ============================================================================
// OpenAI-specific request/response types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAiMessage {
    fn text(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String, // JSON string
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunctionDefinition,
}

#[derive(Debug, Serialize)]
struct OpenAiFunctionDefinition {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    id: String,
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// ============================================================================
// OpenAiProvider
// ============================================================================

/// OpenAI LLM provider
///
/// Translates between the internal message types and the OpenAI API format.
/// Responses are fetched whole; the chat loop replays them as stream events.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    api_base: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider from environment variables
    ///
    /// Reads from:
    /// - `OPENAI_API_KEY` (required)
    /// - `OPENAI_BASE_URL` (optional, defaults to OpenAI API)
    /// - `OPENAI_MAX_TOKENS` (optional, defaults to 4096)
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        tracing::info!("Creating OpenAI provider from environment");

        let api_key = env::var("OPENAI_API_KEY").map_err(|_| BespokenError::MissingApiKey {
            var: "OPENAI_API_KEY",
        })?;

        let mut provider = Self::new(api_key, model);

        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            tracing::info!("Using custom base URL: {}", url);
            provider = provider.with_base_url(url);
        }

        if let Some(max_tokens) = env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            provider = provider.with_max_tokens(max_tokens);
        }

        tracing::info!("Using model: {}", provider.model);
        tracing::info!("Max tokens: {}", provider.max_tokens);
        Ok(provider)
    }

    /// Create a new OpenAI provider with a specific API key
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    // ========================================================================
    // Format conversion: Internal (Anthropic) -> OpenAI
    // ========================================================================

    /// Convert internal messages to OpenAI format
    fn convert_messages(&self, messages: &[Message], system: Option<&str>) -> Vec<OpenAiMessage> {
        let mut openai_messages: Vec<OpenAiMessage> = Vec::new();

        if let Some(system) = system {
            openai_messages.push(OpenAiMessage::text("system", system.to_string()));
        }

        for msg in messages {
            match &msg.content {
                MessageContent::Text(text) => {
                    openai_messages.push(OpenAiMessage::text(&msg.role, text.clone()));
                }
                MessageContent::Blocks(blocks) => {
                    self.convert_blocks_to_messages(blocks, &msg.role, &mut openai_messages);
                }
            }
        }

        openai_messages
    }

    /// Convert content blocks to OpenAI messages
    fn convert_blocks_to_messages(
        &self,
        blocks: &[ContentBlock],
        role: &str,
        openai_messages: &mut Vec<OpenAiMessage>,
    ) {
        let mut text_parts: Vec<String> = Vec::new();
        let mut tool_calls: Vec<OpenAiToolCall> = Vec::new();
        let mut tool_results: Vec<(String, String)> = Vec::new(); // (tool_call_id, content)

        for block in blocks {
            match block {
                ContentBlock::Text { text } => {
                    if !text.is_empty() {
                        text_parts.push(text.clone());
                    }
                }
                ContentBlock::ToolUse { id, name, input } => {
                    let arguments = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
                    tool_calls.push(OpenAiToolCall {
                        id: id.clone(),
                        tool_type: "function".to_string(),
                        function: OpenAiFunctionCall {
                            name: name.clone(),
                            arguments,
                        },
                    });
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    // Tool results are separate messages with role "tool"
                    let result_content = content.clone().unwrap_or_else(|| "No output".to_string());
                    let formatted = if is_error.unwrap_or(false) {
                        format!("Error: {}", result_content)
                    } else {
                        result_content
                    };
                    tool_results.push((tool_use_id.clone(), formatted));
                }
            }
        }

        if role == "assistant" {
            openai_messages.push(OpenAiMessage {
                role: role.to_string(),
                content: if text_parts.is_empty() {
                    None
                } else {
                    Some(text_parts.join("\n"))
                },
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
                tool_call_id: None,
            });
        } else if !text_parts.is_empty() {
            openai_messages.push(OpenAiMessage::text("user", text_parts.join("\n")));
        }

        for (tool_call_id, content) in tool_results {
            openai_messages.push(OpenAiMessage {
                role: "tool".to_string(),
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_call_id),
            });
        }
    }

    /// Convert internal tool definitions to OpenAI format
    fn convert_tools(&self, tools: &[ToolDefinition]) -> Option<Vec<OpenAiTool>> {
        if tools.is_empty() {
            return None;
        }

        let openai_tools = tools
            .iter()
            .map(|tool| {
                let mut parameters = serde_json::json!({
                    "type": tool.input_schema.schema_type,
                    "properties": tool.input_schema.properties.clone().unwrap_or_else(|| serde_json::json!({})),
                });
                if let Some(ref required) = tool.input_schema.required {
                    parameters["required"] = serde_json::json!(required);
                }
                OpenAiTool {
                    tool_type: "function".to_string(),
                    function: OpenAiFunctionDefinition {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters,
                    },
                }
            })
            .collect();

        Some(openai_tools)
    }

    fn build_request(&self, request: &ChatRequest) -> OpenAiRequest {
        let tools = self.convert_tools(&request.tools);
        let tool_choice = tools.as_ref().map(|_| "auto".to_string());

        // Reasoning models use max_completion_tokens instead of max_tokens
        let is_reasoning_model = ["o1", "o3", "o4", "gpt-5"]
            .iter()
            .any(|prefix| self.model.starts_with(prefix));

        let (max_tokens, max_completion_tokens) = if is_reasoning_model {
            (None, Some(self.max_tokens))
        } else {
            (Some(self.max_tokens), None)
        };

        OpenAiRequest {
            model: self.model.clone(),
            messages: self.convert_messages(&request.messages, request.system.as_deref()),
            max_tokens,
            max_completion_tokens,
            tools,
            tool_choice,
        }
    }

    // ========================================================================
    // Format conversion: OpenAI -> Internal (Anthropic)
    // ========================================================================

    fn convert_response(&self, openai_resp: OpenAiResponse) -> Result<MessageResponse> {
        let choice = openai_resp
            .choices
            .into_iter()
            .next()
            .context("No choices in OpenAI response")?;

        let mut content = Vec::new();
        if let Some(text) = choice.message.content {
            if !text.is_empty() {
                content.push(ContentBlock::Text { text });
            }
        }
        for tool_call in choice.message.tool_calls.unwrap_or_default() {
            let input: Value = serde_json::from_str(&tool_call.function.arguments)
                .unwrap_or_else(|_| serde_json::json!({}));
            content.push(ContentBlock::tool_use(tool_call.id, tool_call.function.name, input));
        }

        let stop_reason = choice.finish_reason.as_deref().map(|r| match r {
            "length" => StopReason::MaxTokens,
            "tool_calls" => StopReason::ToolUse,
            "content_filter" => StopReason::Refusal,
            _ => StopReason::EndTurn,
        });

        let usage = openai_resp
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(MessageResponse {
            id: openai_resp.id,
            response_type: "message".to_string(),
            role: "assistant".to_string(),
            content,
            model: openai_resp.model,
            stop_reason,
            stop_sequence: None,
            usage,
        })
    }
}

// ============================================================================
// LlmProvider implementation
// ============================================================================

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn send(&self, request: ChatRequest) -> Result<MessageResponse> {
        tracing::info!("[OpenAI] Sending message with tools");
        tracing::debug!("[OpenAI] Messages count: {}", request.messages.len());
        tracing::debug!("[OpenAI] Tools count: {}", request.tools.len());

        let body = self.build_request(&request);
        let url = format!("{}/chat/completions", self.api_base);
        let request_json =
            serde_json::to_string(&body).context("Failed to serialize OpenAI request")?;
        tracing::debug!("[OpenAI] Request JSON: {}", request_json);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .body(request_json)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read OpenAI response body")?;

        tracing::debug!("[OpenAI] Response status: {}", status);
        tracing::debug!("[OpenAI] Response body: {}", response_text);

        if !status.is_success() {
            tracing::error!("[OpenAI] API error: {} - {}", status, response_text);
            return Err(BespokenError::Api {
                provider: "openai",
                status: status.as_u16(),
                body: response_text,
            }
            .into());
        }

        let openai_response: OpenAiResponse =
            serde_json::from_str(&response_text).context("Failed to parse OpenAI API response")?;
        self.convert_response(openai_response)
    }
}
