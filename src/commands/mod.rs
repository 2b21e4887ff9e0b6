//! Slash commands typed at the chat prompt
//!
//! Built-in commands live next to user commands registered from closures.

pub mod builtins;
pub mod registry;

pub use builtins::{register_builtins, FnCommand};
pub use registry::{CommandContext, CommandInfo, CommandOutcome, SlashCommand, SlashCommandRegistry};
