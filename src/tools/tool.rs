//! Tool trait definition
//!
//! All tools implement this trait to provide a consistent interface.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::ToolDefinition;
use crate::ui::Console;

/// Result of executing a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Text returned to the model
    pub output: String,
    /// Whether the tool execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
        }
    }
}

/// Information about a tool call for permission prompts
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool
    pub name: String,
    /// Human-readable description of what this invocation will do
    pub action_description: String,
    /// Additional details about the action (e.g., file to edit)
    pub details: Option<String>,
}

/// What a tool can reach while it runs
pub struct ToolContext<'a> {
    pub console: &'a Console,
}

impl<'a> ToolContext<'a> {
    pub fn new(console: &'a Console) -> Self {
        Self { console }
    }
}

/// Trait for tools that the model can call
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of this tool
    fn name(&self) -> &str;

    /// Get a description of this tool
    fn description(&self) -> &str;

    /// Get the tool definition sent to the model
    fn definition(&self) -> ToolDefinition;

    /// Describe what this invocation will do
    ///
    /// This is used to display permission prompts to the user.
    fn get_info(&self, input: &Value) -> ToolInfo {
        ToolInfo {
            name: self.name().to_string(),
            action_description: format!("Run {}", self.name()),
            details: Some(input.to_string()),
        }
    }

    /// Execute the tool with the given input
    ///
    /// Recoverable failures are returned as [`ToolResult::error`].
    async fn execute(&self, input: &Value, ctx: &ToolContext<'_>) -> Result<ToolResult>;

    /// Check if this invocation needs the user's permission
    ///
    /// Default is true - tools should generally require permission.
    fn requires_permission(&self, _input: &Value) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("output");
        assert_eq!(result.output, "output");
        assert!(!result.is_error);
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("error message");
        assert_eq!(result.output, "error message");
        assert!(result.is_error);
    }
}
