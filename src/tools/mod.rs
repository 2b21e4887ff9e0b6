//! Tool system for the chat loop
//!
//! This module provides the Tool trait, the ToolRegistry and the built-in
//! tools the model can call.

pub mod browser;
pub mod file_edit;
pub mod markdown;
pub mod not_installed;
mod registry;
pub mod todo;
mod tool;
pub mod web_fetch;

pub use browser::BrowserTool;
pub use file_edit::FileEditTool;
pub use not_installed::NotInstalled;
pub use registry::ToolRegistry;
pub use todo::{new_todo_list, TodoItem, TodoList, TodoTool};
pub use tool::{Tool, ToolContext, ToolInfo, ToolResult};
pub use web_fetch::WebFetchTool;
