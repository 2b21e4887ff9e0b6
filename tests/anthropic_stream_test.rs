// Tests for Anthropic server-sent event streaming against a local mock server

use anyhow::Result;
use bespoken::llm::{
    AnthropicProvider, ChatRequest, ContentBlock, LlmProvider, Message, ResponseAssembler,
    StopReason,
};
use bespoken::BespokenError;
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(events: &[serde_json::Value]) -> String {
    events
        .iter()
        .map(|e| format!("event: {}\ndata: {}\n\n", e["type"].as_str().unwrap_or(""), e))
        .collect()
}

fn request() -> ChatRequest {
    ChatRequest {
        messages: vec![Message::user("List my todos")],
        system: Some("Be brief.".to_string()),
        tools: vec![],
    }
}

#[tokio::test]
async fn test_stream_text_and_tool_use() -> Result<()> {
    let body = sse(&[
        json!({"type": "message_start", "message": {"id": "msg_1", "model": "claude-test", "usage": {"input_tokens": 20, "output_tokens": 1}}}),
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        json!({"type": "ping"}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Let me "}}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "check."}}),
        json!({"type": "content_block_stop", "index": 0}),
        json!({"type": "content_block_start", "index": 1, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "todo", "input": {}}}),
        json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"comm"}}),
        json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "and\": \"list\"}"}}),
        json!({"type": "content_block_stop", "index": 1}),
        json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": {"output_tokens": 30}}),
        json!({"type": "message_stop"}),
    ]);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({"model": "claude-test", "stream": true, "system": "Be brief."})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new("test-key", "claude-test").with_base_url(server.uri());
    let mut events = provider.stream(request()).await?;

    let mut text = String::new();
    let mut assembler = ResponseAssembler::new();
    while let Some(event) = events.next().await {
        let event = event?;
        if let Some(delta) = event.text_delta() {
            text.push_str(delta);
        }
        assembler.apply(&event)?;
    }
    let response = assembler.finish()?;

    assert_eq!(text, "Let me check.");
    assert_eq!(response.id, "msg_1");
    assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
    assert_eq!(response.usage.input_tokens, 20);
    assert_eq!(response.usage.output_tokens, 30);
    assert_eq!(
        response.content,
        vec![
            ContentBlock::text("Let me check."),
            ContentBlock::tool_use("toolu_1", "todo", json!({"command": "list"})),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_stream_error_event() -> Result<()> {
    let body = sse(&[
        json!({"type": "message_start", "message": {"id": "msg_2", "model": "claude-test"}}),
        json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}),
    ]);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new("test-key", "claude-test").with_base_url(server.uri());
    let mut events = provider.stream(request()).await?;

    let mut assembler = ResponseAssembler::new();
    let mut failure = None;
    while let Some(event) = events.next().await {
        if let Err(e) = assembler.apply(&event?) {
            failure = Some(e);
            break;
        }
    }

    let failure = failure.expect("error event should fail assembly");
    assert!(matches!(
        failure.downcast_ref::<BespokenError>(),
        Some(BespokenError::Stream(message)) if message.contains("Overloaded")
    ));
    Ok(())
}

#[tokio::test]
async fn test_send_non_streaming() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_3",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Hello!"}],
            "model": "claude-test",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 5, "output_tokens": 2}
        })))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new("test-key", "claude-test").with_base_url(server.uri());
    let response = provider.send(request()).await?;
    assert_eq!(response.text(), "Hello!");
    assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
    Ok(())
}

#[tokio::test]
async fn test_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("{\"error\":\"overloaded\"}"))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new("test-key", "claude-test").with_base_url(server.uri());
    let err = match provider.stream(request()).await {
        Ok(_) => panic!("expected an error"),
        Err(e) => e,
    };
    assert!(matches!(
        err.downcast_ref::<BespokenError>(),
        Some(BespokenError::Api { status: 529, .. })
    ));
}
