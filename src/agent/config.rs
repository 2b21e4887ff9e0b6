//! Builder for a chat session

use anyhow::Result;

use crate::commands::{FnCommand, SlashCommand};
use crate::styles::CustomBanner;
use crate::tools::Tool;
use crate::ui::Console;

/// Model used when none is given
pub const DEFAULT_MODEL: &str = "anthropic/claude-3-5-sonnet-20240620";

/// Everything needed to start [`crate::chat`]
///
/// ```rust,ignore
/// let config = ChatConfig::new("anthropic/claude-3-5-sonnet-20240620")
///     .system_prompt("You are a coding assistant.")
///     .tool(FileEditTool::single_file("edit.py"))
///     .first_message("What should we change?");
/// bespoken::chat(config).await?;
/// ```
pub struct ChatConfig {
    pub model_name: String,
    pub system_prompt: Option<String>,
    pub tools: Vec<Box<dyn Tool>>,
    pub slash_commands: Vec<Box<dyn SlashCommand>>,
    pub debug: bool,
    /// Greeting shown before the first prompt. Not part of the history.
    pub first_message: Option<String>,
    pub show_banner: bool,
    /// Name of the banner style
    pub style: String,
    /// Art that replaces the style's banner
    pub custom_banner: Option<CustomBanner>,
    /// Tools that run without asking for permission
    pub trusted_tools: Vec<String>,
}

impl ChatConfig {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            system_prompt: None,
            tools: Vec::new(),
            slash_commands: Vec::new(),
            debug: false,
            first_message: None,
            show_banner: true,
            style: "default".to_string(),
            custom_banner: None,
            trusted_tools: Vec::new(),
        }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    pub fn tools(mut self, tools: Vec<Box<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Register a slash command backed by a closure
    ///
    /// The closure returns `Some(text)` to send text to the model, or `None`
    /// when it handled the command itself. The leading `/` is optional.
    pub fn slash_command<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Console) -> Result<Option<String>> + Send + Sync + 'static,
    {
        self.slash_commands.push(Box::new(FnCommand::new(name, handler)));
        self
    }

    pub fn command(mut self, command: Box<dyn SlashCommand>) -> Self {
        self.slash_commands.push(command);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn first_message(mut self, message: impl Into<String>) -> Self {
        self.first_message = Some(message.into());
        self
    }

    pub fn show_banner(mut self, show: bool) -> Self {
        self.show_banner = show;
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Show custom ASCII art instead of the style's banner
    ///
    /// Without a subtitle the default one is shown under the art.
    pub fn ascii_art(mut self, art: impl Into<String>, subtitle: Option<&str>) -> Self {
        let banner = CustomBanner::new(art);
        self.custom_banner = Some(match subtitle {
            Some(subtitle) => banner.with_subtitle(subtitle),
            None => banner,
        });
        self
    }

    /// Let a tool run without asking
    pub fn trust(mut self, tool_name: impl Into<String>) -> Self {
        self.trusted_tools.push(tool_name.into());
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}
