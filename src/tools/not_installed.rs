//! Stand-in for tools whose cargo feature is not compiled in

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::tool::{Tool, ToolContext, ToolResult};
use crate::error::BespokenError;
use crate::llm::{define_tool, ToolDefinition};

/// Placeholder that fails with install instructions whenever it is used
#[derive(Debug, Clone)]
pub struct NotInstalled {
    tool: String,
    feature: String,
    extra: Option<String>,
}

impl NotInstalled {
    pub fn new(tool: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            feature: feature.into(),
            extra: None,
        }
    }

    /// Append extra setup instructions to the error message
    pub fn with_instructions(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    pub fn error(&self) -> BespokenError {
        BespokenError::NotInstalled {
            tool: self.tool.clone(),
            feature: self.feature.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Any direct use of the missing tool
    pub fn call(&self) -> Result<(), BespokenError> {
        Err(self.error())
    }
}

#[async_trait]
impl Tool for NotInstalled {
    fn name(&self) -> &str {
        &self.tool
    }

    fn description(&self) -> &str {
        "Not available in this build."
    }

    fn definition(&self) -> ToolDefinition {
        define_tool(&self.tool, self.description(), json!({}), &[])
    }

    async fn execute(&self, _input: &Value, _ctx: &ToolContext<'_>) -> Result<ToolResult> {
        Err(self.error().into())
    }

    fn requires_permission(&self, _input: &Value) -> bool {
        false
    }
}
