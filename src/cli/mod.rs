//! Command-line entry point: flags and the built-in tool set

mod args;

pub use args::CliArgs;

use anyhow::Result;
use std::sync::Arc;

use crate::agent::{chat_with_console, ChatConfig};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use crate::tools::browser::browser_not_installed;
use crate::tools::web_fetch::DEFAULT_TIMEOUT_SECS;
use crate::tools::{BrowserTool, FileEditTool, TodoTool, Tool, WebFetchTool};
use crate::ui::Console;

/// Tools offered by the `bespoken` binary
pub fn builtin_tools(args: &CliArgs, console: &Console) -> Result<Vec<Box<dyn Tool>>> {
    let mut tools: Vec<Box<dyn Tool>> = vec![
        Box::new(FileEditTool::new()?),
        Box::new(TodoTool::new()),
        Box::new(WebFetchTool::new(DEFAULT_TIMEOUT_SECS)?),
    ];

    if args.browser {
        match BrowserTool::new() {
            Ok(browser) => tools.push(Box::new(browser)),
            Err(e) => {
                tracing::warn!("Browser tool unavailable: {}", e);
                console.tool_warning(&e.to_string());
                tools.push(Box::new(browser_not_installed()));
            }
        }
    }

    Ok(tools)
}

/// Turn parsed flags into a chat configuration
pub fn config_from_args(args: &CliArgs, tools: Vec<Box<dyn Tool>>) -> ChatConfig {
    let mut config = ChatConfig::new(&args.model)
        .system_prompt(args.system.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT))
        .tools(tools)
        .debug(args.debug)
        .show_banner(!args.no_banner)
        .style(&args.style);
    for tool in &args.trust {
        config = config.trust(tool);
    }
    config
}

/// Run the binary
pub async fn run(args: CliArgs) -> Result<()> {
    tracing::info!("Starting bespoken with model {}", args.model);
    let console = Arc::new(Console::new().with_debug(args.debug));
    let tools = builtin_tools(&args, &console)?;
    chat_with_console(config_from_args(&args, tools), console).await
}
