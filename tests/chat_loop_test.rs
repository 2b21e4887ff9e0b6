// End-to-end tests of the chat loop with a scripted model and an in-memory console

use anyhow::Result;
use async_trait::async_trait;
use bespoken::llm::{
    ChatRequest, ContentBlock, LlmProvider, MessageContent, MessageResponse, StopReason, Usage,
};
use bespoken::tools::{FileEditTool, TodoTool};
use bespoken::ui::{Interrupt, SharedBuffer};
use bespoken::{ChatConfig, ChatSession, Console};
use serde_json::json;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

type Requests = Arc<Mutex<Vec<ChatRequest>>>;

/// Replays canned responses and records every request
struct ScriptedProvider {
    responses: Mutex<Vec<Result<MessageResponse>>>,
    requests: Requests,
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn model(&self) -> &str {
        "scripted-model"
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: ChatRequest) -> Result<MessageResponse> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            anyhow::bail!("script exhausted");
        }
        responses.remove(0)
    }
}

fn text(reply: &str) -> Result<MessageResponse> {
    Ok(response(vec![ContentBlock::text(reply)], StopReason::EndTurn))
}

fn tool_call(id: &str, name: &str, input: serde_json::Value) -> Result<MessageResponse> {
    Ok(response(vec![ContentBlock::tool_use(id, name, input)], StopReason::ToolUse))
}

fn response(content: Vec<ContentBlock>, stop_reason: StopReason) -> MessageResponse {
    MessageResponse {
        id: "msg_test".to_string(),
        response_type: "message".to_string(),
        role: "assistant".to_string(),
        content,
        model: "scripted-model".to_string(),
        stop_reason: Some(stop_reason),
        stop_sequence: None,
        usage: Usage::default(),
    }
}

struct Harness {
    session: ChatSession,
    output: SharedBuffer,
    requests: Requests,
}

fn harness(responses: Vec<Result<MessageResponse>>, config: ChatConfig, input: &str) -> Harness {
    let output = SharedBuffer::new();
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let provider = ScriptedProvider {
        responses: Mutex::new(responses),
        requests: requests.clone(),
    };
    let console = Arc::new(Console::with_io(Cursor::new(input.to_string()), output.clone(), 80));
    Harness {
        session: ChatSession::new(Box::new(provider), console, config.show_banner(false)),
        output,
        requests,
    }
}

fn last_user_blocks(request: &ChatRequest) -> Vec<ContentBlock> {
    match &request.messages.last().unwrap().content {
        MessageContent::Blocks(blocks) => blocks.clone(),
        MessageContent::Text(text) => vec![ContentBlock::text(text.clone())],
    }
}

#[tokio::test]
async fn test_conversation_until_quit() -> Result<()> {
    let mut h = harness(
        vec![text("Hi! How can I help?"), text("Sure.")],
        ChatConfig::default()
            .system_prompt("Be brief.")
            .first_message("Welcome, what shall we build?"),
        "hello\n\n  \nthanks\nquit\nnever read\n",
    );

    h.session.run().await?;

    let out = h.output.contents();
    assert!(out.contains("  Welcome, what shall we build?\n"));
    assert!(out.contains("  Hi! How can I help?\n"));
    assert!(out.contains("  Sure.\n"));
    assert!(out.contains("Thanks for using Bespoken. Goodbye!"));

    // The greeting is display-only
    let requests = h.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[0].system.as_deref(), Some("Be brief."));
    assert_eq!(requests[1].messages.len(), 3);
    assert_eq!(h.session.conversation().len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_end_of_input_ends_session() -> Result<()> {
    let mut h = harness(vec![], ChatConfig::default(), "");
    h.session.run().await?;
    assert!(h.output.contents().contains("Goodbye!"));
    assert!(h.requests.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_tool_call_with_permission() -> Result<()> {
    let dir = TempDir::new()?;
    let mut h = harness(
        vec![
            tool_call(
                "toolu_1",
                "file_edit",
                json!({"command": "create", "path": "hello.txt", "content": "hi\n"}),
            ),
            text("Created it."),
        ],
        ChatConfig::default().tool(FileEditTool::with_base_dir(dir.path())),
        "make a file\ny\nquit\n",
    );

    h.session.run().await?;

    assert_eq!(std::fs::read_to_string(dir.path().join("hello.txt"))?, "hi\n");
    let out = h.output.contents();
    assert!(out.contains("Permission required: file_edit"));
    assert!(out.contains("Created it."));

    let requests = h.requests.lock().unwrap();
    let results = last_user_blocks(&requests[1]);
    assert!(matches!(
        &results[0],
        ContentBlock::ToolResult { tool_use_id, is_error, .. } if tool_use_id == "toolu_1" && is_error.is_none()
    ));
    Ok(())
}

#[tokio::test]
async fn test_denied_tool_reports_to_model() -> Result<()> {
    let dir = TempDir::new()?;
    let mut h = harness(
        vec![
            tool_call(
                "toolu_1",
                "file_edit",
                json!({"command": "create", "path": "nope.txt", "content": "x"}),
            ),
            text("Okay, I won't."),
        ],
        ChatConfig::default().tool(FileEditTool::with_base_dir(dir.path())),
        "make a file\nn\nquit\n",
    );

    h.session.run().await?;

    assert!(!dir.path().join("nope.txt").exists());
    let requests = h.requests.lock().unwrap();
    assert_eq!(
        last_user_blocks(&requests[1]),
        vec![ContentBlock::tool_result("toolu_1", "Permission denied by user", true)]
    );
    Ok(())
}

#[tokio::test]
async fn test_trusted_tool_skips_prompt() -> Result<()> {
    let dir = TempDir::new()?;
    let mut h = harness(
        vec![
            tool_call(
                "toolu_1",
                "file_edit",
                json!({"command": "create", "path": "trusted.txt", "content": "ok"}),
            ),
            text("Done."),
        ],
        ChatConfig::default()
            .tool(FileEditTool::with_base_dir(dir.path()))
            .trust("file_edit"),
        "go\nquit\n",
    );

    h.session.run().await?;

    assert!(dir.path().join("trusted.txt").exists());
    assert!(!h.output.contents().contains("Permission required"));
    Ok(())
}

#[tokio::test]
async fn test_always_allow_is_remembered() -> Result<()> {
    let dir = TempDir::new()?;
    let mut h = harness(
        vec![
            tool_call("t1", "file_edit", json!({"command": "create", "path": "a.txt", "content": "a"})),
            tool_call("t2", "file_edit", json!({"command": "create", "path": "b.txt", "content": "b"})),
            text("Both written."),
        ],
        ChatConfig::default().tool(FileEditTool::with_base_dir(dir.path())),
        "write two files\nalways\nquit\n",
    );

    h.session.run().await?;

    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.txt").exists());
    assert_eq!(h.output.contents().matches("Permission required").count(), 1);
    assert_eq!(h.session.permissions().trusted(), vec!["file_edit"]);
    Ok(())
}

#[tokio::test]
async fn test_debug_output() -> Result<()> {
    let mut h = harness(
        vec![tool_call("t1", "todo", json!({"command": "list"})), text("Nothing to do.")],
        ChatConfig::default().tool(TodoTool::new()).debug(true),
        "what's left?\nquit\n",
    );

    h.session.run().await?;

    let out = h.output.contents();
    assert!(out.contains("Debug mode enabled"));
    assert!(out.contains(">>> LLM Response:"));
    assert!(out.contains(r#">>> LLM calling tool: todo({"command":"list"})"#));
    assert!(out.contains(">>> Tool returning to LLM: No todos found."));
    Ok(())
}

#[tokio::test]
async fn test_provider_error_keeps_history_valid() -> Result<()> {
    let mut h = harness(
        vec![Err(anyhow::anyhow!("service unavailable")), text("Back again.")],
        ChatConfig::default(),
        "first\nsecond\nquit\n",
    );

    h.session.run().await?;

    let out = h.output.contents();
    assert!(out.contains("Error: service unavailable"));
    assert!(out.contains("Back again."));

    // The failed turn left nothing behind
    let requests = h.requests.lock().unwrap();
    assert_eq!(requests[1].messages.len(), 1);
    assert_eq!(requests[1].messages[0].text(), "second");
    assert_eq!(h.session.conversation().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_slash_commands() -> Result<()> {
    let mut h = harness(
        vec![text("Arr, ask away!")],
        ChatConfig::default()
            .tool(TodoTool::new())
            .trust("todo")
            .slash_command("/voice", |console| {
                let role = console.choice("What role should I take?", &["teacher", "pirate"])?;
                Ok(Some(format!("You are now acting as a {}.", role)))
            }),
        "/tools\n/help\n/nope\n/voice\n2\n/quit\nnever read\n",
    );

    h.session.run().await?;

    let out = h.output.contents();
    assert!(out.contains("todo (trusted)"));
    assert!(out.contains("Custom commands:"));
    assert!(out.contains("Unknown command: /nope"));
    assert!(out.contains("Arr, ask away!"));

    let requests = h.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages[0].text(), "You are now acting as a pirate.");
    Ok(())
}

#[tokio::test]
async fn test_custom_banner_replaces_style() -> Result<()> {
    let output = SharedBuffer::new();
    let provider = ScriptedProvider {
        responses: Mutex::new(vec![]),
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let console = Arc::new(Console::with_io(Cursor::new(String::new()), output.clone(), 80));
    let config = ChatConfig::default()
        .style("hacker")
        .ascii_art("~~ TUTOR ~~", Some("Ask me anything."));

    ChatSession::new(Box::new(provider), console, config).run().await?;

    let out = output.contents();
    assert!(out.starts_with("\n  ~~ TUTOR ~~\n\n  Ask me anything.\n"));
    assert!(!out.contains("system ready"));
    Ok(())
}

/// Hangs on the first request after firing the interrupt, then replies
struct HangingProvider {
    interrupt: Interrupt,
    calls: Mutex<usize>,
    requests: Requests,
}

#[async_trait]
impl LlmProvider for HangingProvider {
    fn model(&self) -> &str {
        "hanging-model"
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: ChatRequest) -> Result<MessageResponse> {
        self.requests.lock().unwrap().push(request);
        let first = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls == 1
        };
        if first {
            self.interrupt.trigger();
            futures::future::pending::<()>().await;
        }
        Ok(response(vec![ContentBlock::text("Still here.")], StopReason::EndTurn))
    }
}

struct LiveHarness {
    session: ChatSession,
    output: SharedBuffer,
    lines: mpsc::UnboundedSender<String>,
    interrupt: Interrupt,
}

fn live_harness(provider: impl FnOnce(Interrupt) -> Box<dyn LlmProvider>, config: ChatConfig) -> LiveHarness {
    let output = SharedBuffer::new();
    let (lines, rx) = mpsc::unbounded_channel();
    let console = Arc::new(Console::with_lines(rx, output.clone(), 80));
    let interrupt = console.interrupt().clone();
    LiveHarness {
        session: ChatSession::new(provider(interrupt.clone()), console, config.show_banner(false)),
        output,
        lines,
        interrupt,
    }
}

async fn wait_for(output: &SharedBuffer, needle: &str, times: usize) {
    while output.contents().matches(needle).count() < times {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_interrupt_mid_turn_rolls_back() -> Result<()> {
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let mut h = live_harness(
        |interrupt| {
            Box::new(HangingProvider {
                interrupt,
                calls: Mutex::new(0),
                requests: requests.clone(),
            })
        },
        ChatConfig::default(),
    );
    for line in ["write an epic", "hello again", "quit"] {
        h.lines.send(line.to_string())?;
    }

    tokio::time::timeout(Duration::from_secs(5), h.session.run()).await??;

    let out = h.output.contents();
    assert!(out.contains("Interrupted."));
    assert!(out.contains("Still here."));
    assert!(out.contains("Goodbye!"));

    // the interrupted message is gone from the history
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].messages.len(), 1);
    assert_eq!(requests[1].messages[0].text(), "hello again");
    assert_eq!(h.session.conversation().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_interrupt_at_prompt_says_goodbye() -> Result<()> {
    let mut h = harness_waiting_for_input();
    let output = h.output.clone();
    let interrupt = h.interrupt.clone();
    tokio::spawn(async move {
        wait_for(&output, "> ", 1).await;
        interrupt.trigger();
    });

    tokio::time::timeout(Duration::from_secs(5), h.session.run()).await??;

    assert!(h.output.contents().contains("Thanks for using Bespoken. Goodbye!"));
    assert!(h.session.conversation().is_empty());
    Ok(())
}

fn harness_waiting_for_input() -> LiveHarness {
    live_harness(
        |_| {
            Box::new(ScriptedProvider {
                responses: Mutex::new(vec![]),
                requests: Arc::new(Mutex::new(Vec::new())),
            })
        },
        ChatConfig::default(),
    )
}

#[tokio::test]
async fn test_interrupt_at_permission_prompt_runs_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let mut h = live_harness(
        |_| {
            Box::new(ScriptedProvider {
                responses: Mutex::new(vec![
                    tool_call(
                        "toolu_1",
                        "file_edit",
                        json!({"command": "create", "path": "late.txt", "content": "x"}),
                    ),
                    text("Fine."),
                ]),
                requests: requests.clone(),
            })
        },
        ChatConfig::default().tool(FileEditTool::with_base_dir(dir.path())),
    );
    h.lines.send("make a file".to_string())?;

    let output = h.output.clone();
    let interrupt = h.interrupt.clone();
    let lines = h.lines.clone();
    tokio::spawn(async move {
        wait_for(&output, "Allow? [Y/n/always/never]: ", 1).await;
        interrupt.trigger();
        wait_for(&output, "> ", 2).await;
        lines.send("quit".to_string()).ok();
    });

    tokio::time::timeout(Duration::from_secs(5), h.session.run()).await??;

    assert!(!dir.path().join("late.txt").exists());
    assert!(h.output.contents().contains("Interrupted."));
    assert!(h.session.conversation().is_empty());
    assert_eq!(requests.lock().unwrap().len(), 1);
    Ok(())
}
