//! A coding assistant that can only edit one file
//!
//! ```sh
//! export ANTHROPIC_API_KEY="sk-ant-..."
//! cargo run --example file_editor
//! ```

use anyhow::Result;
use bespoken::tools::FileEditTool;
use bespoken::{chat, ChatConfig};

#[tokio::main]
async fn main() -> Result<()> {
    bespoken::logging::init_logging()?;

    chat(
        ChatConfig::new("anthropic/claude-3-5-sonnet-20240620")
            .tool(FileEditTool::single_file("edit.py"))
            .system_prompt(
                "You are a coding assistant that can make edits to a single file that is defined by the filetool.",
            ),
    )
    .await
}
