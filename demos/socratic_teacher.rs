//! A Socratic teacher with a `/voice` command to change its persona
//!
//! ```sh
//! cargo run --example socratic_teacher
//! ```

use anyhow::Result;
use bespoken::prompts::SOCRATIC_PROMPT;
use bespoken::{chat, ChatConfig, Console};

const ROLES: [&str; 3] = ["technical teacher", "pirate", "twitter techbro"];

/// Set a role for the assistant
fn set_voice(console: &Console) -> Result<Option<String>> {
    let role = console.choice("What role should I take?", &ROLES)?;
    Ok(Some(format!(
        "You are now acting as a {}. Please respond in character but stick to the topic of teaching.",
        role
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    bespoken::logging::init_logging()?;

    chat(
        ChatConfig::new("anthropic/claude-3-5-sonnet-20240620")
            .system_prompt(SOCRATIC_PROMPT)
            .slash_command("/voice", set_voice)
            .first_message("I can teach you anything about a technical topic. What would you like to learn?")
            .show_banner(false),
    )
    .await
}
