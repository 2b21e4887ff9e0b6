//! Plain functions exposed to the model as tools
//!
//! ```sh
//! cargo run --example function_tools
//! ```

use anyhow::Result;
use async_trait::async_trait;
use bespoken::llm::{define_tool, ToolDefinition};
use bespoken::tools::{Tool, ToolContext, ToolResult};
use bespoken::{chat, ChatConfig};
use serde_json::{json, Value};
use std::path::Path;

/// A tool wrapping a function of one optional string argument
struct FnTool {
    name: &'static str,
    description: &'static str,
    arg: &'static str,
    required: bool,
    func: fn(Option<&str>) -> Result<String>,
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn definition(&self) -> ToolDefinition {
        let required: &[&str] = if self.required { &[self.arg] } else { &[] };
        define_tool(
            self.name,
            self.description,
            json!({ self.arg: { "type": "string" } }),
            required,
        )
    }

    async fn execute(&self, input: &Value, _ctx: &ToolContext<'_>) -> Result<ToolResult> {
        let arg = input.get(self.arg).and_then(|v| v.as_str());
        Ok(match (self.func)(arg) {
            Ok(output) => ToolResult::success(output),
            Err(e) => ToolResult::error(format!("Error: {:#}", e)),
        })
    }

    fn requires_permission(&self, _input: &Value) -> bool {
        false
    }
}

fn ls(folder: Option<&str>) -> Result<String> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(Path::new(folder.unwrap_or(".")))? {
        entries.push(entry?.path().display().to_string());
    }
    entries.sort();
    Ok(entries.join("\n"))
}

fn upper(text: Option<&str>) -> Result<String> {
    Ok(text.unwrap_or_default().to_uppercase())
}

fn reverse(text: Option<&str>) -> Result<String> {
    Ok(text.unwrap_or_default().chars().rev().collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    bespoken::logging::init_logging()?;

    chat(
        ChatConfig::new("claude-3-7-sonnet-latest")
            .tool(FnTool {
                name: "ls",
                description: "Show the files in the current directory.",
                arg: "folder",
                required: false,
                func: ls,
            })
            .tool(FnTool {
                name: "upper",
                description: "convert text to upper case",
                arg: "text",
                required: true,
                func: upper,
            })
            .tool(FnTool {
                name: "reverse",
                description: "reverse text",
                arg: "text",
                required: true,
                func: reverse,
            }),
    )
    .await
}
