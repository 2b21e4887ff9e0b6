//! The chat session: configuration, the conversation loop and its entry point

pub mod agent_loop;
pub mod config;

pub use agent_loop::{ChatSession, MAX_TOOL_ITERATIONS};
pub use config::{ChatConfig, DEFAULT_MODEL};

use anyhow::Result;
use std::sync::Arc;

use crate::llm::provider_for_model;
use crate::ui::{Console, Tone};

/// Run an interactive chat on the terminal until the user quits
pub async fn chat(config: ChatConfig) -> Result<()> {
    let console = Arc::new(Console::new().with_debug(config.debug));
    chat_with_console(config, console).await
}

/// Like [`chat`], on a console of the caller's choosing
pub async fn chat_with_console(config: ChatConfig, console: Arc<Console>) -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) => tracing::debug!("No .env loaded: {}", e),
    }

    let provider = match provider_for_model(&config.model_name) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!("Failed to load model '{}': {:#}", config.model_name, e);
            console.print_colored(
                &format!("Error loading model '{}': {:#}", config.model_name, e),
                Tone::Red,
            );
            return Err(e);
        }
    };

    ChatSession::new(provider, console, config).run().await
}
