//! Built-in slash commands and closure-backed user commands.
//!
//! - `/help` -- list built-in and custom commands
//! - `/tools` -- list the tools offered to the model
//! - `/debug` -- toggle debug output
//! - `/quit` -- exit

use anyhow::Result;

use super::registry::{normalize_name, CommandContext, CommandOutcome, SlashCommand, SlashCommandRegistry};
use crate::ui::{Console, Tone, LEFT_PADDING};

/// Register all built-in slash commands into the given registry.
pub fn register_builtins(registry: &mut SlashCommandRegistry) {
    registry.register(Box::new(HelpCommand));
    registry.register(Box::new(ToolsCommand));
    registry.register(Box::new(DebugCommand));
    registry.register(Box::new(QuitCommand));
}

// ── /help ─────────────────────────────────────────────────────────────────

struct HelpCommand;

impl SlashCommand for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Show available commands"
    }

    fn execute(&self, _args: &str, ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
        let width = ctx.commands.iter().map(|c| c.name.len()).max().unwrap_or(0) + 1;
        let (builtin, custom): (Vec<_>, Vec<_>) = ctx.commands.iter().partition(|c| c.builtin);

        ctx.console.blank_line();
        ctx.console.print_colored("Built-in commands:", Tone::Bold);
        for cmd in &builtin {
            ctx.console.print_indented(
                &format!("/{:<width$}  {}", cmd.name, cmd.description, width = width),
                LEFT_PADDING + 2,
            );
        }
        if !custom.is_empty() {
            ctx.console.blank_line();
            ctx.console.print_colored("Custom commands:", Tone::Bold);
            for cmd in &custom {
                ctx.console.print_indented(
                    &format!("/{:<width$}  {}", cmd.name, cmd.description, width = width),
                    LEFT_PADDING + 2,
                );
            }
        }
        ctx.console.blank_line();
        Ok(CommandOutcome::Handled)
    }

    fn is_builtin(&self) -> bool {
        true
    }
}

// ── /tools ────────────────────────────────────────────────────────────────

struct ToolsCommand;

impl SlashCommand for ToolsCommand {
    fn name(&self) -> &str {
        "tools"
    }

    fn description(&self) -> &str {
        "List available tools"
    }

    fn execute(&self, _args: &str, ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
        ctx.console.blank_line();
        if ctx.tools.is_empty() {
            ctx.console.print("No tools available.");
            ctx.console.blank_line();
            return Ok(CommandOutcome::Handled);
        }

        ctx.console
            .print_colored(&format!("Available tools ({}):", ctx.tools.len()), Tone::Bold);
        for (name, description) in &ctx.tools {
            let marker = if ctx.trusted.contains(name) { " (trusted)" } else { "" };
            ctx.console
                .print_indented(&format!("{}{}: {}", name, marker, description), LEFT_PADDING + 2);
        }
        ctx.console.blank_line();
        Ok(CommandOutcome::Handled)
    }

    fn is_builtin(&self) -> bool {
        true
    }
}

// ── /debug ────────────────────────────────────────────────────────────────

struct DebugCommand;

impl SlashCommand for DebugCommand {
    fn name(&self) -> &str {
        "debug"
    }

    fn description(&self) -> &str {
        "Toggle debug output"
    }

    fn execute(&self, _args: &str, ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
        let enabled = ctx.console.toggle_debug();
        tracing::info!("Debug mode toggled: {}", enabled);
        let state = if enabled { "enabled" } else { "disabled" };
        ctx.console.print_colored(&format!("Debug mode {}", state), Tone::Magenta);
        Ok(CommandOutcome::Handled)
    }

    fn is_builtin(&self) -> bool {
        true
    }
}

// ── /quit ─────────────────────────────────────────────────────────────────

struct QuitCommand;

impl SlashCommand for QuitCommand {
    fn name(&self) -> &str {
        "quit"
    }

    fn description(&self) -> &str {
        "Exit the session"
    }

    fn execute(&self, _args: &str, _ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
        Ok(CommandOutcome::Quit)
    }

    fn is_builtin(&self) -> bool {
        true
    }
}

// ── user commands ─────────────────────────────────────────────────────────

type Handler = Box<dyn Fn(&Console) -> Result<Option<String>> + Send + Sync>;

/// A slash command backed by a closure.
///
/// `Some(text)` from the closure is sent to the model; `None` means the
/// command handled everything itself.
pub struct FnCommand {
    name: String,
    description: String,
    handler: Handler,
}

impl FnCommand {
    pub fn new<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&Console) -> Result<Option<String>> + Send + Sync + 'static,
    {
        Self {
            name: normalize_name(name).to_string(),
            description: "Custom command".to_string(),
            handler: Box::new(handler),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl SlashCommand for FnCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&self, _args: &str, ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
        Ok(match (self.handler)(ctx.console)? {
            Some(text) => CommandOutcome::SendToModel(text),
            None => CommandOutcome::Handled,
        })
    }
}
