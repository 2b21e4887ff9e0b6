//! bespoken: a terminal chat assistant you configure in code
//!
//! Pick a model, a system prompt, some tools and slash commands, then hand
//! control to [`chat`].
//!
//! ```rust,ignore
//! use bespoken::{chat, ChatConfig};
//! use bespoken::tools::FileEditTool;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     chat(
//!         ChatConfig::new("anthropic/claude-3-5-sonnet-20240620")
//!             .system_prompt("You are a coding assistant that edits a single file.")
//!             .tool(FileEditTool::single_file("edit.py")),
//!     )
//!     .await
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod commands;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod logging;
pub mod permissions;
pub mod prompts;
pub mod styles;
pub mod tools;
pub mod ui;

pub use agent::{chat, chat_with_console, ChatConfig, ChatSession};
pub use error::BespokenError;
pub use ui::Console;
