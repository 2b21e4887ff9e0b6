//! Slash command registry and dispatch.
//!
//! The [`SlashCommandRegistry`] holds named [`SlashCommand`] handlers and
//! dispatches user input that starts with `/` to the matching one.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::ui::Console;

/// What the chat loop should do after a command ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command did its work locally
    Handled,
    /// Send this text to the model as if the user had typed it
    SendToModel(String),
    /// End the session
    Quit,
}

/// Name and description of a registered command, for help output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
}

/// Session state a command may inspect.
pub struct CommandContext<'a> {
    pub console: &'a Console,
    /// `(name, description)` of every tool offered to the model
    pub tools: Vec<(String, String)>,
    /// Tools that run without asking
    pub trusted: Vec<String>,
    /// Filled in by the registry before a command runs
    pub commands: Vec<CommandInfo>,
}

impl<'a> CommandContext<'a> {
    pub fn new(console: &'a Console) -> Self {
        Self {
            console,
            tools: Vec::new(),
            trusted: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<(String, String)>, trusted: Vec<String>) -> Self {
        self.tools = tools;
        self.trusted = trusted;
        self
    }
}

/// A slash command handler.
///
/// The name is given without the leading `/`.
pub trait SlashCommand: Send + Sync {
    fn name(&self) -> &str;

    /// One-line description for help text.
    fn description(&self) -> &str;

    fn execute(&self, args: &str, ctx: &mut CommandContext<'_>) -> Result<CommandOutcome>;

    /// Whether this command ships with the crate
    fn is_builtin(&self) -> bool {
        false
    }
}

/// Strip the optional leading `/` from a command name
pub fn normalize_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix('/').unwrap_or(name)
}

/// Registry of slash commands with dispatch.
#[derive(Default)]
pub struct SlashCommandRegistry {
    commands: BTreeMap<String, Box<dyn SlashCommand>>,
}

impl SlashCommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command, replacing any command with the same name.
    pub fn register(&mut self, cmd: Box<dyn SlashCommand>) {
        let name = normalize_name(cmd.name()).to_string();
        if self.commands.insert(name.clone(), cmd).is_some() {
            tracing::debug!("Replaced slash command /{}", name);
        }
    }

    /// Register a command unless one with the same name exists.
    ///
    /// Returns `Err(name)` on collision; the new command is dropped.
    pub fn register_checked(&mut self, cmd: Box<dyn SlashCommand>) -> Result<(), String> {
        let name = normalize_name(cmd.name()).to_string();
        if self.commands.contains_key(&name) {
            return Err(name);
        }
        self.commands.insert(name, cmd);
        Ok(())
    }

    /// Whether a line of input should go to the dispatcher
    pub fn is_command_line(line: &str) -> bool {
        line.trim_start().starts_with('/')
    }

    /// Dispatch a line of input.
    ///
    /// Returns `None` for a line that is not a command, and `Some(Err)` for an
    /// unknown command.
    pub fn dispatch(&self, line: &str, ctx: &mut CommandContext<'_>) -> Option<Result<CommandOutcome>> {
        let line = line.trim();
        let without_slash = line.strip_prefix('/')?;
        let (name, args) = match without_slash.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (without_slash, ""),
        };

        let Some(cmd) = self.commands.get(name) else {
            return Some(Err(anyhow::anyhow!(
                "Unknown command: /{}. Type /help for available commands.",
                name
            )));
        };

        tracing::info!("Running slash command /{}", name);
        ctx.commands = self.describe();
        Some(cmd.execute(args, ctx))
    }

    pub fn has(&self, name: &str) -> bool {
        self.commands.contains_key(normalize_name(name))
    }

    /// Registered command names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(|s| s.as_str()).collect()
    }

    pub fn describe(&self) -> Vec<CommandInfo> {
        self.commands
            .iter()
            .map(|(name, cmd)| CommandInfo {
                name: name.clone(),
                description: cmd.description().to_string(),
                builtin: cmd.is_builtin(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::SharedBuffer;
    use std::io::Cursor;

    struct EchoCommand;

    impl SlashCommand for EchoCommand {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo arguments back"
        }
        fn execute(&self, args: &str, _ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
            Ok(CommandOutcome::SendToModel(format!("echo: {args}")))
        }
    }

    struct SlashedName;

    impl SlashCommand for SlashedName {
        fn name(&self) -> &str {
            "/voice"
        }
        fn description(&self) -> &str {
            "Registered with a slash"
        }
        fn execute(&self, _args: &str, _ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
            Ok(CommandOutcome::Handled)
        }
    }

    fn console() -> Console {
        Console::with_io(Cursor::new(String::new()), SharedBuffer::new(), 80)
    }

    #[test]
    fn dispatch_splits_name_and_args() {
        let console = console();
        let mut ctx = CommandContext::new(&console);
        let mut reg = SlashCommandRegistry::new();
        reg.register(Box::new(EchoCommand));

        let outcome = reg.dispatch("  /echo hello   world ", &mut ctx).unwrap().unwrap();
        assert_eq!(outcome, CommandOutcome::SendToModel("echo: hello   world".into()));
        assert_eq!(ctx.commands.len(), 1);
    }

    #[test]
    fn dispatch_non_command_and_unknown() {
        let console = console();
        let mut ctx = CommandContext::new(&console);
        let reg = SlashCommandRegistry::new();

        assert!(reg.dispatch("hello", &mut ctx).is_none());
        let err = reg.dispatch("/nope", &mut ctx).unwrap().unwrap_err();
        assert!(err.to_string().contains("Unknown command: /nope"));
    }

    #[test]
    fn leading_slash_in_name_is_optional() {
        let mut reg = SlashCommandRegistry::new();
        reg.register(Box::new(SlashedName));
        assert_eq!(reg.names(), vec!["voice"]);
        assert!(reg.has("/voice"));
        assert!(reg.has("voice"));
    }

    #[test]
    fn register_checked_refuses_duplicates() {
        let mut reg = SlashCommandRegistry::new();
        assert!(reg.register_checked(Box::new(EchoCommand)).is_ok());
        assert_eq!(reg.register_checked(Box::new(EchoCommand)), Err("echo".to_string()));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn is_command_line() {
        assert!(SlashCommandRegistry::is_command_line("/help"));
        assert!(SlashCommandRegistry::is_command_line("  /help"));
        assert!(!SlashCommandRegistry::is_command_line("help /me"));
    }
}
