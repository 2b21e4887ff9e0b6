//! Registry of the tools offered to the model

use anyhow::Result;
use serde_json::Value;

use super::tool::{Tool, ToolContext, ToolInfo, ToolResult};
use crate::llm::ToolDefinition;

/// Ordered collection of tools, looked up by name
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == name) {
            tracing::warn!("Replacing tool: {}", name);
            *existing = tool;
        } else {
            tracing::debug!("Registered tool: {}", name);
            self.tools.push(tool);
        }
    }

    pub fn with_tools(tools: Vec<Box<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Tool definitions in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// `(name, description)` pairs for display
    pub fn describe(&self) -> Vec<(&str, &str)> {
        self.tools.iter().map(|t| (t.name(), t.description())).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get_tool_info(&self, name: &str, input: &Value) -> Option<ToolInfo> {
        self.get(name).map(|t| t.get_info(input))
    }

    /// Unknown tools need permission so they are never run silently
    pub fn requires_permission(&self, name: &str, input: &Value) -> bool {
        self.get(name)
            .map(|t| t.requires_permission(input))
            .unwrap_or(true)
    }

    /// Run a tool by name. An unknown name is an error result, not an `Err`.
    pub async fn execute(
        &self,
        name: &str,
        input: &Value,
        ctx: &ToolContext<'_>,
    ) -> Result<ToolResult> {
        let Some(tool) = self.get(name) else {
            tracing::warn!("Model called unknown tool: {}", name);
            return Ok(ToolResult::error(format!("Unknown tool: {}", name)));
        };
        tracing::info!("Executing tool: {}", name);
        tool.execute(input, ctx).await
    }
}
