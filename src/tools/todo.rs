//! Todo list tool
//!
//! One tool with a `command` field so the model can add, list, complete and
//! clear tasks during a session.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};

use super::tool::{Tool, ToolContext, ToolInfo, ToolResult};
use crate::llm::{define_tool, ToolDefinition};

/// A single todo item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub task: String,
    pub done: bool,
    pub created: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<DateTime<Local>>,
}

/// Shared todo list state
pub type TodoList = Arc<RwLock<Vec<TodoItem>>>;

/// Create a new shared todo list
pub fn new_todo_list() -> TodoList {
    Arc::new(RwLock::new(Vec::new()))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum TodoCommand {
    Add { task: String },
    List,
    Done { index: usize },
    Flush,
}

/// Todo tool for managing tasks
pub struct TodoTool {
    todos: TodoList,
}

impl TodoTool {
    pub fn new() -> Self {
        Self::with_list(new_todo_list())
    }

    /// Share a list with other owners (e.g. to inspect it after a session)
    pub fn with_list(todos: TodoList) -> Self {
        Self { todos }
    }

    /// Get a snapshot of the current list
    pub fn get_todos(&self) -> Vec<TodoItem> {
        self.todos.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn add(&self, task: String) -> ToolResult {
        let result = format!("Added todo: '{}'", task);
        self.todos
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(TodoItem {
                task,
                done: false,
                created: Local::now(),
                completed: None,
            });
        ToolResult::success(result)
    }

    fn list(&self) -> ToolResult {
        let todos = self.todos.read().unwrap_or_else(|e| e.into_inner());
        if todos.is_empty() {
            return ToolResult::success("No todos found. Add one with the 'add' command.");
        }

        let mut lines = vec!["Todo List:".to_string()];
        for (i, todo) in todos.iter().enumerate() {
            let status = if todo.done { "✓" } else { "○" };
            lines.push(format!("{}. [{}] {}", i + 1, status, todo.task));
        }
        ToolResult::success(lines.join("\n"))
    }

    fn done(&self, index: usize) -> ToolResult {
        let mut todos = self.todos.write().unwrap_or_else(|e| e.into_inner());
        let count = todos.len();
        let Some(todo) = index.checked_sub(1).and_then(|i| todos.get_mut(i)) else {
            return ToolResult::error(format!(
                "No todo #{}. The list has {} item(s); indexes start at 1.",
                index, count
            ));
        };
        todo.done = true;
        todo.completed = Some(Local::now());
        ToolResult::success(format!("Marked as done: '{}'", todo.task))
    }

    fn flush(&self) -> ToolResult {
        self.todos.write().unwrap_or_else(|e| e.into_inner()).clear();
        ToolResult::success("Flushed todos. All todos have been deleted.")
    }
}

impl Default for TodoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for TodoTool {
    fn name(&self) -> &str {
        "todo"
    }

    fn description(&self) -> &str {
        "Manage a todo list. Commands: 'add' a task, 'list' all tasks, mark a task 'done' by its 1-based index, or 'flush' to delete every task."
    }

    fn definition(&self) -> ToolDefinition {
        define_tool(
            self.name(),
            self.description(),
            json!({
                "command": {
                    "type": "string",
                    "enum": ["add", "list", "done", "flush"],
                    "description": "The action to perform"
                },
                "task": {
                    "type": "string",
                    "description": "Task description for 'add'"
                },
                "index": {
                    "type": "integer",
                    "description": "1-based index of the task for 'done', as shown by 'list'"
                }
            }),
            &["command"],
        )
    }

    fn get_info(&self, input: &Value) -> ToolInfo {
        let command = input.get("command").and_then(|v| v.as_str()).unwrap_or("list");
        ToolInfo {
            name: self.name().to_string(),
            action_description: format!("Todo: {}", command),
            details: None,
        }
    }

    async fn execute(&self, input: &Value, ctx: &ToolContext<'_>) -> Result<ToolResult> {
        let command: TodoCommand = match serde_json::from_value(input.clone()) {
            Ok(command) => command,
            Err(e) => return Ok(ToolResult::error(format!("Invalid todo input: {}", e))),
        };

        let result = match command {
            TodoCommand::Add { task } => {
                ctx.console.tool_status(&format!("Adding todo: {}", task));
                self.add(task)
            }
            TodoCommand::List => {
                ctx.console.tool_status("Listing todos...");
                self.list()
            }
            TodoCommand::Done { index } => {
                ctx.console.tool_status(&format!("Marking todo #{} as done...", index));
                self.done(index)
            }
            TodoCommand::Flush => {
                ctx.console.tool_status("Flushing all todos...");
                self.flush()
            }
        };
        Ok(result)
    }

    fn requires_permission(&self, _input: &Value) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{Console, SharedBuffer};
    use std::io::Cursor;

    async fn run(tool: &TodoTool, input: Value) -> ToolResult {
        let console = Console::with_io(Cursor::new(String::new()), SharedBuffer::new(), 80);
        tool.execute(&input, &ToolContext::new(&console)).await.unwrap()
    }

    #[tokio::test]
    async fn test_todo_lifecycle() {
        let tool = TodoTool::new();

        let result = run(&tool, json!({"command": "list"})).await;
        assert!(result.output.starts_with("No todos found"));

        let result = run(&tool, json!({"command": "add", "task": "buy milk"})).await;
        assert_eq!(result.output, "Added todo: 'buy milk'");
        run(&tool, json!({"command": "add", "task": "write tests"})).await;

        let result = run(&tool, json!({"command": "done", "index": 1})).await;
        assert_eq!(result, ToolResult::success("Marked as done: 'buy milk'"));
        assert!(tool.get_todos()[0].completed.is_some());

        let result = run(&tool, json!({"command": "list"})).await;
        assert_eq!(result.output, "Todo List:\n1. [✓] buy milk\n2. [○] write tests");

        let result = run(&tool, json!({"command": "flush"})).await;
        assert_eq!(result.output, "Flushed todos. All todos have been deleted.");
        assert!(tool.get_todos().is_empty());
    }

    #[tokio::test]
    async fn test_done_out_of_range() {
        let tool = TodoTool::new();
        run(&tool, json!({"command": "add", "task": "only"})).await;

        for index in [0, 2] {
            let result = run(&tool, json!({"command": "done", "index": index})).await;
            assert!(result.is_error);
        }
        assert!(!tool.get_todos()[0].done);
    }

    #[tokio::test]
    async fn test_shared_list_and_status_output() {
        let list = new_todo_list();
        let tool = TodoTool::with_list(list.clone());
        let out = SharedBuffer::new();
        let console = Console::with_io(Cursor::new(String::new()), out.clone(), 80);

        tool.execute(&json!({"command": "add", "task": "ship"}), &ToolContext::new(&console))
            .await
            .unwrap();
        assert_eq!(list.read().unwrap().len(), 1);
        assert_eq!(out.contents(), "\n  Adding todo: ship\n\n");
        assert!(!tool.requires_permission(&json!({})));
    }

    #[tokio::test]
    async fn test_bad_input() {
        let tool = TodoTool::new();
        let result = run(&tool, json!({"command": "remove"})).await;
        assert!(result.is_error);
    }
}
