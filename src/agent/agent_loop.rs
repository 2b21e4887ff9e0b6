//! Chat loop with tool calling support
//!
//! The session operates in two loops:
//! - Outer loop: user conversation (user input → model response)
//! - Inner loop: tool execution (model requests tool → execute → continue)

use anyhow::Result;
use futures::StreamExt;
use std::io;
use std::sync::Arc;

use super::config::ChatConfig;
use crate::commands::{register_builtins, CommandContext, CommandOutcome, SlashCommandRegistry};
use crate::conversation::Conversation;
use crate::llm::{
    ChatRequest, ContentBlock, EventStream, LlmProvider, Message, MessageResponse, ResponseAssembler,
    StopReason, StreamEvent,
};
use crate::permissions::{PermissionManager, PermissionRequest, PERMISSION_DENIED};
use crate::styles::{Banner, Style};
use crate::tools::{ToolContext, ToolRegistry, ToolResult};
use crate::ui::{is_interrupted, Console, Spinner, Tone};

/// Maximum number of model calls in a single turn
pub const MAX_TOOL_ITERATIONS: usize = 50;

const GOODBYE: &str = "Thanks for using Bespoken. Goodbye!";

enum Input {
    Line(String),
    Eof,
    Interrupted,
}

enum TurnEnd {
    Done(Result<()>),
    Interrupted,
}

/// One interactive chat session
pub struct ChatSession {
    console: Arc<Console>,
    provider: Box<dyn LlmProvider>,
    conversation: Conversation,
    tools: ToolRegistry,
    commands: SlashCommandRegistry,
    permissions: PermissionManager,
    system_prompt: Option<String>,
    first_message: Option<String>,
    banner: Option<Banner>,
}

impl ChatSession {
    /// Create a session around a resolved provider and a console
    pub fn new(provider: Box<dyn LlmProvider>, console: Arc<Console>, config: ChatConfig) -> Self {
        if config.debug {
            console.set_debug(true);
        }

        let mut commands = SlashCommandRegistry::new();
        register_builtins(&mut commands);
        for command in config.slash_commands {
            commands.register(command);
        }

        let banner = config.show_banner.then(|| match config.custom_banner {
            Some(custom) => Banner::Custom(custom),
            None => Banner::Preset(Style::by_name(&config.style).unwrap_or_else(|| {
                tracing::warn!("Unknown style '{}', using default", config.style);
                Style::default_style()
            })),
        });

        let conversation = Conversation::new();
        tracing::info!(
            "Conversation {} with {} ({} tools)",
            conversation.id(),
            provider.model(),
            config.tools.len()
        );

        Self {
            console,
            provider,
            conversation,
            tools: ToolRegistry::with_tools(config.tools),
            commands,
            permissions: PermissionManager::with_trusted(config.trusted_tools),
            system_prompt: config.system_prompt,
            first_message: config.first_message,
            banner,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn permissions(&self) -> &PermissionManager {
        &self.permissions
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Run the session until the user quits or input ends
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Starting chat loop");
        self.greet();

        loop {
            let line = match self.read_input().await? {
                Input::Line(line) => line,
                Input::Eof => {
                    tracing::info!("Input closed");
                    break;
                }
                Input::Interrupted => {
                    tracing::info!("Interrupted at the prompt");
                    self.console.blank_line();
                    break;
                }
            };

            if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                tracing::info!("User requested exit");
                break;
            }

            if line.is_empty() {
                continue;
            }

            let text = if SlashCommandRegistry::is_command_line(&line) {
                match self.run_command(&line) {
                    CommandOutcome::Handled => continue,
                    CommandOutcome::Quit => break,
                    CommandOutcome::SendToModel(text) => text,
                }
            } else {
                line
            };

            let checkpoint = self.conversation.len();
            let interrupt = self.console.interrupt().clone();
            let end = tokio::select! {
                result = self.process_turn(&text) => TurnEnd::Done(result),
                _ = interrupt.wait() => TurnEnd::Interrupted,
            };
            let end = match end {
                TurnEnd::Done(Err(e)) if is_interrupted(&e) => TurnEnd::Interrupted,
                end => end,
            };
            match end {
                TurnEnd::Done(Ok(())) => {}
                TurnEnd::Done(Err(e)) => {
                    tracing::error!("Turn failed: {:#}", e);
                    self.console.print_colored(&format!("Error: {:#}", e), Tone::Red);
                }
                TurnEnd::Interrupted => {
                    tracing::info!("Turn interrupted");
                    self.console.clear_line();
                    self.console.end_stream();
                    self.conversation.rollback(checkpoint);
                    self.console.print_colored("Interrupted.", Tone::Yellow);
                }
            }
            self.console.blank_line();
        }

        self.console.blank_line();
        self.console.print_colored(GOODBYE, Tone::Cyan);
        self.console.blank_line();
        tracing::info!("Chat loop ended");
        Ok(())
    }

    fn greet(&self) {
        match &self.banner {
            Some(Banner::Preset(style)) => self.console.show_banner(style),
            Some(Banner::Custom(custom)) => self.console.show_custom_banner(custom),
            None => {}
        }
        if self.console.is_debug() {
            self.console.print_colored("Debug mode enabled", Tone::Magenta);
            self.console.blank_line();
        }
        if let Some(message) = &self.first_message {
            self.console.print_neutral(message);
            self.console.blank_line();
        }
    }

    async fn read_input(&self) -> Result<Input> {
        match self.console.read_line("> ").await {
            Ok(Some(line)) => Ok(Input::Line(line)),
            Ok(None) => Ok(Input::Eof),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Input::Interrupted),
            Err(e) => Err(e.into()),
        }
    }

    fn run_command(&self, line: &str) -> CommandOutcome {
        let mut ctx = CommandContext::new(&self.console).with_tools(
            self.tools
                .describe()
                .into_iter()
                .map(|(name, description)| (name.to_string(), description.to_string()))
                .collect(),
            self.permissions.trusted().into_iter().map(String::from).collect(),
        );

        match self.commands.dispatch(line, &mut ctx) {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) if is_interrupted(&e) => {
                tracing::info!("Slash command interrupted");
                self.console.print_colored("Interrupted.", Tone::Yellow);
                CommandOutcome::Handled
            }
            Some(Err(e)) => {
                tracing::warn!("Slash command failed: {:#}", e);
                self.console.tool_error(&format!("{:#}", e));
                CommandOutcome::Handled
            }
            None => CommandOutcome::SendToModel(line.to_string()),
        }
    }

    /// Process a single user turn, which may involve several tool calls
    ///
    /// On failure the history is restored to what it was before the turn.
    pub async fn process_turn(&mut self, user_message: &str) -> Result<()> {
        let checkpoint = self.conversation.len();
        self.conversation.push(Message::user(user_message));

        let result = self.tool_loop().await;
        if result.is_err() {
            self.conversation.rollback(checkpoint);
        }
        result
    }

    async fn tool_loop(&mut self) -> Result<()> {
        for iteration in 1..=MAX_TOOL_ITERATIONS {
            tracing::debug!("Model call {} of this turn", iteration);
            let request = ChatRequest {
                messages: self.conversation.messages().to_vec(),
                system: self.system_prompt.clone(),
                tools: self.tools.definitions(),
            };

            let response = self.stream_response(request).await?;
            tracing::info!(
                "Response {}: stop={:?}, tokens in/out {}/{}",
                response.id,
                response.stop_reason,
                response.usage.input_tokens,
                response.usage.output_tokens
            );

            if response.content.is_empty() {
                return Ok(());
            }
            self.conversation
                .push(Message::assistant_with_blocks(response.content.clone()));

            if response.has_tool_use() {
                let results = self.run_tools(&response).await?;
                self.conversation.push(Message::user_with_blocks(results));
            }

            if response.stop_reason != Some(StopReason::ToolUse) {
                return Ok(());
            }
        }

        tracing::warn!("Maximum tool iterations reached");
        self.console
            .tool_warning("Maximum tool iterations reached. Stopping.");
        Ok(())
    }

    /// Stream one response to the console and assemble it
    async fn stream_response(&self, request: ChatRequest) -> Result<MessageResponse> {
        self.console.blank_line();
        let mut spinner = Spinner::start(self.console.clone());

        let result = match self.provider.stream(request).await {
            Ok(events) => self.render_events(events, &mut spinner).await,
            Err(e) => Err(e),
        };

        spinner.stop().await;
        self.console.end_stream();
        result
    }

    async fn render_events(&self, mut events: EventStream, spinner: &mut Spinner) -> Result<MessageResponse> {
        let mut assembler = ResponseAssembler::new();
        let mut started = false;

        while let Some(event) = events.next().await {
            let event = event?;
            if !started {
                started = true;
                spinner.stop().await;
                if self.console.is_debug() {
                    self.console.tool_debug(">>> LLM Response:");
                    self.console.blank_line();
                }
            }

            match &event {
                StreamEvent::ContentBlockStop { .. } => self.console.end_stream(),
                event => {
                    if let Some(text) = event.text_delta() {
                        self.console.stream_chunk(text);
                    }
                }
            }
            assembler.apply(&event)?;
        }

        assembler.finish()
    }

    /// Execute every tool call in a response, in order
    async fn run_tools(&mut self, response: &MessageResponse) -> Result<Vec<ContentBlock>> {
        let mut results = Vec::new();
        for block in &response.content {
            let ContentBlock::ToolUse { id, name, input } = block else {
                continue;
            };
            tracing::info!("Tool use requested: {} ({})", name, id);
            self.console
                .tool_debug(&format!(">>> LLM calling tool: {}({})", name, input));

            let result = self.execute_tool(name, input).await?;

            self.console
                .tool_debug(&format!(">>> Tool returning to LLM: {}", result.output));
            results.push(ContentBlock::tool_result(id.clone(), result.output, result.is_error));
        }
        Ok(results)
    }

    async fn execute_tool(&mut self, name: &str, input: &serde_json::Value) -> Result<ToolResult> {
        if !self.is_allowed(name, input).await? {
            tracing::info!("Tool {} denied", name);
            return Ok(ToolResult::error(PERMISSION_DENIED));
        }

        let ctx = ToolContext::new(&self.console);
        let result = match self.tools.execute(name, input, &ctx).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Tool {} failed: {:#}", name, e);
                let message = format!("Tool execution failed: {:#}", e);
                self.console.tool_error(&message);
                ToolResult::error(message)
            }
        };
        Ok(result)
    }

    /// Trust gate: trusted tools run, blocked tools don't, everything else asks
    ///
    /// An interrupted question fails the turn before the tool runs.
    async fn is_allowed(&mut self, name: &str, input: &serde_json::Value) -> Result<bool> {
        if !self.tools.requires_permission(name, input) {
            return Ok(true);
        }

        match self.permissions.check_auto_decision(name) {
            Some(true) => Ok(true),
            Some(false) => {
                self.console
                    .tool_warning(&format!("Tool {} is blocked (always deny)", name));
                Ok(false)
            }
            None => {
                let request = match self.tools.get_tool_info(name, input) {
                    Some(info) => PermissionRequest {
                        tool_name: info.name,
                        action_description: info.action_description,
                        details: info.details,
                    },
                    None => PermissionRequest::new(name, format!("Run unknown tool: {}", name)),
                };
                let decision = match self.console.ask_permission(&request).await {
                    Ok(decision) => decision,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                        tracing::info!("Permission prompt for {} interrupted, tool not run", name);
                        return Err(e.into());
                    }
                    Err(e) => return Err(e.into()),
                };
                self.permissions.process_decision(name, decision);
                tracing::info!("Permission for {}: {:?}", name, decision);
                Ok(decision.is_allowed())
            }
        }
    }
}
