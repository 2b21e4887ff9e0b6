//! Web fetch tool
//!
//! Downloads a page and hands it to the model as markdown.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::markdown::html_to_markdown;
use super::tool::{Tool, ToolContext, ToolInfo, ToolResult};
use crate::llm::{define_tool, ToolDefinition};

/// Default timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Maximum output length in characters
pub const MAX_OUTPUT_CHARS: usize = 50_000;

const USER_AGENT: &str = concat!("bespoken/", env!("CARGO_PKG_VERSION"));

/// Web fetch tool
pub struct WebFetchTool {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct WebFetchInput {
    url: String,
}

impl WebFetchTool {
    /// Create a fetch tool whose requests give up after `timeout_secs`
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Fetch a URL and return its content as markdown
    pub async fn fetch_url(&self, url: &str) -> Result<String> {
        tracing::info!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()?;

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(true, |ct| ct.contains("html"));

        let body = response.text().await.context("Failed to read response body")?;
        let output = if is_html { html_to_markdown(&body) } else { body };

        tracing::debug!("Fetched {} chars from {}", output.chars().count(), url);
        Ok(truncate(output))
    }
}

/// Cut the text at the character limit, marking the cut
pub(crate) fn truncate(mut output: String) -> String {
    if let Some((byte_index, _)) = output.char_indices().nth(MAX_OUTPUT_CHARS) {
        output.truncate(byte_index);
        output.push_str("\n\n... (content truncated)");
    }
    output
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return its content as markdown."
    }

    fn definition(&self) -> ToolDefinition {
        define_tool(
            self.name(),
            "Fetches a web page over HTTP(S) and converts the HTML into clean markdown \
             (headings, paragraphs, links, lists). Long pages are truncated.",
            json!({
                "url": {
                    "type": "string",
                    "description": "The full URL to fetch, including the scheme"
                }
            }),
            &["url"],
        )
    }

    fn get_info(&self, input: &Value) -> ToolInfo {
        let url = input.get("url").and_then(|v| v.as_str()).unwrap_or("?");
        ToolInfo {
            name: self.name().to_string(),
            action_description: format!("Fetch: {}", url),
            details: Some(format!("URL: {}", url)),
        }
    }

    async fn execute(&self, input: &Value, ctx: &ToolContext<'_>) -> Result<ToolResult> {
        let fetch_input: WebFetchInput = match serde_json::from_value(input.clone()) {
            Ok(input) => input,
            Err(e) => return Ok(ToolResult::error(format!("Error: invalid input: {}", e))),
        };

        ctx.console.tool_status(&format!("Fetching {}", fetch_input.url));

        match self.fetch_url(&fetch_input.url).await {
            Ok(output) => Ok(ToolResult::success(output)),
            Err(e) => {
                tracing::warn!("Fetch failed: {:#}", e);
                ctx.console.tool_error(&format!("Could not fetch {}", fetch_input.url));
                Ok(ToolResult::error(format!("Error: {:#}", e)))
            }
        }
    }

    fn requires_permission(&self, _input: &Value) -> bool {
        false // Read-only fetch doesn't need permission
    }
}
