//! File editing tool with glob patterns and str_replace functionality
//!
//! This tool provides file operations including:
//! - View files (with optional line range)
//! - Create or overwrite files
//! - Replace text in files (str_replace)
//! - Insert text at a line
//! - Search files using glob patterns
//!
//! The tool works either on a directory tree or on one bound file.

use anyhow::{Context, Result};
use async_trait::async_trait;
use glob::glob;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use super::tool::{Tool, ToolContext, ToolInfo, ToolResult};
use crate::llm::{define_tool, ToolDefinition};

const MAX_FILE_SIZE: usize = 1_000_000;
const MAX_GLOB_RESULTS: usize = 100;

/// What the tool may touch
#[derive(Debug, Clone)]
enum Scope {
    /// Any path under a base directory (absolute paths allowed)
    Directory(PathBuf),
    /// Only this file
    SingleFile(PathBuf),
}

/// File edit tool for viewing and modifying files
pub struct FileEditTool {
    scope: Scope,
    description: String,
    max_file_size: usize,
}

/// Input commands for the file edit tool
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum FileCommand {
    View {
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        start_line: Option<usize>,
        #[serde(default)]
        end_line: Option<usize>,
    },
    Create {
        #[serde(default)]
        path: Option<String>,
        content: String,
    },
    StrReplace {
        #[serde(default)]
        path: Option<String>,
        old_str: String,
        new_str: String,
    },
    Glob {
        pattern: String,
    },
    Insert {
        #[serde(default)]
        path: Option<String>,
        line: usize,
        content: String,
    },
}

impl FileEditTool {
    /// Create a new FileEditTool with the current directory as base
    pub fn new() -> Result<Self> {
        let base_dir = std::env::current_dir().context("Failed to read current directory")?;
        Ok(Self::with_base_dir(base_dir))
    }

    /// Create a new FileEditTool with a specific base directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            scope: Scope::Directory(base_dir.into()),
            description: "View, create, and edit files. Supports viewing files with line numbers, \
                creating files, replacing text (str_replace), inserting lines, and searching with glob patterns."
                .to_string(),
            max_file_size: MAX_FILE_SIZE,
        }
    }

    /// Create a FileEditTool bound to one file
    pub fn single_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let description = format!(
            "View and edit the file {}. Supports viewing with line numbers, replacing text \
             (str_replace), inserting lines, and rewriting the whole file (create). \
             The path argument may be omitted.",
            path.display()
        );
        Self {
            scope: Scope::SingleFile(path),
            description,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    /// Set the maximum file size
    pub fn with_max_file_size(mut self, max_size: usize) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Resolve a path against the scope, rejecting paths outside a single-file scope
    fn resolve_path(&self, path: Option<&str>) -> Result<PathBuf> {
        match &self.scope {
            Scope::Directory(base) => {
                let path = path.context("The 'path' argument is required")?;
                let path = Path::new(path);
                if path.is_absolute() {
                    Ok(path.to_path_buf())
                } else {
                    Ok(base.join(path))
                }
            }
            Scope::SingleFile(bound) => match path {
                None => Ok(bound.clone()),
                Some(p) if Self::same_file(bound, Path::new(p)) => Ok(bound.clone()),
                Some(p) => anyhow::bail!(
                    "This tool can only edit {}. Refusing to touch {}",
                    bound.display(),
                    p
                ),
            },
        }
    }

    fn same_file(bound: &Path, requested: &Path) -> bool {
        if bound == requested {
            return true;
        }
        match (fs::canonicalize(bound), fs::canonicalize(requested)) {
            (Ok(a), Ok(b)) => a == b,
            _ => bound.file_name() == requested.file_name() && requested.parent().map_or(true, |p| p.as_os_str().is_empty()),
        }
    }

    fn display_path(&self, path: &Path) -> String {
        match &self.scope {
            Scope::Directory(base) => path
                .strip_prefix(base)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string(),
            Scope::SingleFile(_) => path.to_string_lossy().to_string(),
        }
    }

    /// View file contents
    fn view_file(&self, path: &Path, start_line: Option<usize>, end_line: Option<usize>) -> Result<String> {
        tracing::info!("Viewing file: {}", path.display());

        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to access file: {}", path.display()))?;

        if metadata.len() as usize > self.max_file_size {
            anyhow::bail!(
                "File too large ({} bytes). Maximum allowed: {} bytes",
                metadata.len(),
                self.max_file_size
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let lines: Vec<&str> = content.lines().collect();
        let total_lines = lines.len();
        let shown = self.display_path(path);

        if total_lines == 0 {
            return Ok(format!("File: {} is empty", shown));
        }

        let start = start_line.unwrap_or(1).saturating_sub(1);
        let end = end_line.unwrap_or(total_lines).min(total_lines);

        if start >= total_lines || start >= end {
            return Ok(format!(
                "File has {} lines. Requested range {}-{} is out of range.",
                total_lines,
                start + 1,
                end
            ));
        }

        let mut result = format!("File: {} ({} lines total)\n", shown, total_lines);
        result.push_str(&format!("Showing lines {}-{}:\n\n", start + 1, end));
        for (i, line) in lines[start..end].iter().enumerate() {
            result.push_str(&format!("{:>4} | {}\n", start + i + 1, line));
        }

        Ok(result)
    }

    /// Create or overwrite a file
    fn create_file(&self, path: &Path, content: &str) -> Result<String> {
        tracing::info!("Writing file: {}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let existed = path.exists();
        fs::write(path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        let verb = if existed { "overwritten" } else { "created" };
        Ok(format!("File {} successfully: {}", verb, self.display_path(path)))
    }

    /// Replace exactly one occurrence of a string
    fn str_replace(&self, path: &Path, old_str: &str, new_str: &str) -> Result<String> {
        tracing::info!("Replacing text in file: {}", path.display());

        if old_str.is_empty() {
            anyhow::bail!("old_str must not be empty");
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let occurrences = content.matches(old_str).count();
        if occurrences == 0 {
            anyhow::bail!("String not found in file. Make sure to include exact text including whitespace.");
        }
        if occurrences > 1 {
            anyhow::bail!(
                "Found {} occurrences of the string. Please provide a more specific string to ensure only one match.",
                occurrences
            );
        }

        let new_content = content.replacen(old_str, new_str, 1);
        fs::write(path, &new_content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        Ok(format!(
            "Successfully replaced text in {}. The string was replaced 1 time.",
            self.display_path(path)
        ))
    }

    /// Search for files using a glob pattern
    fn glob_search(&self, pattern: &str) -> Result<String> {
        let Scope::Directory(base) = &self.scope else {
            anyhow::bail!("glob is not available when editing a single file");
        };

        let full_pattern = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            base.join(pattern).to_string_lossy().to_string()
        };
        tracing::info!("Searching with glob pattern: {}", full_pattern);

        let entries: Vec<String> = glob(&full_pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?
            .filter_map(|entry| entry.ok())
            .map(|path| self.display_path(&path))
            .collect();

        if entries.is_empty() {
            return Ok(format!("No files found matching pattern: {}", pattern));
        }

        let mut result = format!("Found {} files matching '{}':\n", entries.len(), pattern);
        for entry in entries.iter().take(MAX_GLOB_RESULTS) {
            result.push_str(&format!("  {}\n", entry));
        }
        if entries.len() > MAX_GLOB_RESULTS {
            result.push_str(&format!("  ... and {} more\n", entries.len() - MAX_GLOB_RESULTS));
        }
        Ok(result)
    }

    /// Insert text before a 1-based line (past the end appends)
    fn insert_at_line(&self, path: &Path, line: usize, content: &str) -> Result<String> {
        tracing::info!("Inserting text at line {} in file: {}", line, path.display());

        let file_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let mut lines: Vec<&str> = file_content.lines().collect();
        let insert_index = line.saturating_sub(1).min(lines.len());
        lines.insert(insert_index, content);

        let mut new_content = lines.join("\n");
        if file_content.ends_with('\n') || file_content.is_empty() {
            new_content.push('\n');
        }

        fs::write(path, &new_content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        Ok(format!(
            "Successfully inserted text at line {} in {}",
            insert_index + 1,
            self.display_path(path)
        ))
    }

    fn run(&self, command: FileCommand, ctx: &ToolContext<'_>) -> Result<String> {
        match command {
            FileCommand::View { path, start_line, end_line } => {
                let path = self.resolve_path(path.as_deref())?;
                ctx.console.tool_status(&format!("Viewing {}", self.display_path(&path)));
                self.view_file(&path, start_line, end_line)
            }
            FileCommand::Create { path, content } => {
                let path = self.resolve_path(path.as_deref())?;
                ctx.console.tool_status(&format!("Writing {}", self.display_path(&path)));
                self.create_file(&path, &content)
            }
            FileCommand::StrReplace { path, old_str, new_str } => {
                let path = self.resolve_path(path.as_deref())?;
                ctx.console.tool_status(&format!("Editing {}", self.display_path(&path)));
                self.str_replace(&path, &old_str, &new_str)
            }
            FileCommand::Glob { pattern } => {
                ctx.console.tool_status(&format!("Searching for {}", pattern));
                self.glob_search(&pattern)
            }
            FileCommand::Insert { path, line, content } => {
                let path = self.resolve_path(path.as_deref())?;
                ctx.console.tool_status(&format!("Inserting into {}", self.display_path(&path)));
                self.insert_at_line(&path, line, &content)
            }
        }
    }
}

#[async_trait]
impl Tool for FileEditTool {
    fn name(&self) -> &str {
        "file_edit"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn definition(&self) -> ToolDefinition {
        let (commands, path_description) = match &self.scope {
            Scope::Directory(_) => (
                vec!["view", "create", "str_replace", "glob", "insert"],
                "File path (relative to the project root or absolute)".to_string(),
            ),
            Scope::SingleFile(path) => (
                vec!["view", "create", "str_replace", "insert"],
                format!("Optional. Must be {} if given", path.display()),
            ),
        };

        let mut properties = json!({
            "command": {
                "type": "string",
                "description": format!("The command to execute: {}", commands.join(", ")),
                "enum": commands
            },
            "path": {
                "type": "string",
                "description": path_description
            },
            "content": {
                "type": "string",
                "description": "Content for 'create' (whole file) or 'insert' (one block of lines)"
            },
            "old_str": {
                "type": "string",
                "description": "String to find for 'str_replace'. Must match exactly once"
            },
            "new_str": {
                "type": "string",
                "description": "String to replace with for 'str_replace'"
            },
            "start_line": {
                "type": "integer",
                "description": "Starting line number for 'view' (1-indexed)"
            },
            "end_line": {
                "type": "integer",
                "description": "Ending line number for 'view' (inclusive)"
            },
            "line": {
                "type": "integer",
                "description": "Line number for 'insert' (1-indexed). Text goes before this line"
            }
        });
        if let Scope::Directory(_) = self.scope {
            properties["pattern"] = json!({
                "type": "string",
                "description": "Glob pattern for 'glob' (e.g., '**/*.rs')"
            });
        }

        define_tool(self.name(), self.description(), properties, &["command"])
    }

    fn get_info(&self, input: &Value) -> ToolInfo {
        let command = input.get("command").and_then(|v| v.as_str()).unwrap_or("unknown");
        let path = input
            .get("path")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| match &self.scope {
                Scope::SingleFile(p) => Some(p.display().to_string()),
                Scope::Directory(_) => None,
            })
            .unwrap_or_else(|| "?".to_string());

        let (action, details) = match command {
            "view" => ("View file", Some(format!("Path: {}", path))),
            "create" => ("Write file", Some(format!("Path: {}", path))),
            "str_replace" => ("Replace text in file", Some(format!("Path: {}", path))),
            "glob" => {
                let pattern = input.get("pattern").and_then(|v| v.as_str()).unwrap_or("?");
                ("Search files", Some(format!("Pattern: {}", pattern)))
            }
            "insert" => {
                let line = input.get("line").and_then(|v| v.as_u64()).unwrap_or(0);
                ("Insert text in file", Some(format!("Path: {}, Line: {}", path, line)))
            }
            _ => ("Unknown file operation", None),
        };

        ToolInfo {
            name: self.name().to_string(),
            action_description: action.to_string(),
            details,
        }
    }

    async fn execute(&self, input: &Value, ctx: &ToolContext<'_>) -> Result<ToolResult> {
        let command: FileCommand = match serde_json::from_value(input.clone()) {
            Ok(command) => command,
            Err(e) => return Ok(ToolResult::error(format!("Invalid file_edit input: {}", e))),
        };

        match self.run(command, ctx) {
            Ok(output) => Ok(ToolResult::success(output)),
            Err(e) => {
                ctx.console.tool_error(&format!("{:#}", e));
                Ok(ToolResult::error(format!("{:#}", e)))
            }
        }
    }

    /// Reading and searching are free; anything that writes asks first
    fn requires_permission(&self, input: &Value) -> bool {
        !matches!(
            input.get("command").and_then(|v| v.as_str()),
            Some("view") | Some("glob")
        )
    }
}
