//! Folding stream events back into a complete response

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;

use super::types::{
    ContentBlock, ContentBlockStart, ContentDelta, MessageResponse, StopReason, StreamEvent, Usage,
};
use crate::error::BespokenError;

#[derive(Debug)]
enum PartialBlock {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        initial_input: Value,
        json: String,
    },
}

/// Accumulates streaming events into a [`MessageResponse`]
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    id: String,
    model: String,
    blocks: BTreeMap<usize, PartialBlock>,
    stop_reason: Option<StopReason>,
    usage: Usage,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. Error events from the provider become errors here.
    pub fn apply(&mut self, event: &StreamEvent) -> Result<()> {
        match event {
            StreamEvent::MessageStart { message } => {
                self.id = message.id.clone();
                self.model = message.model.clone();
                self.usage.input_tokens = message.usage.input_tokens;
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                ContentBlockStart::Text { text } => {
                    self.blocks.insert(*index, PartialBlock::Text(text.clone()));
                }
                ContentBlockStart::ToolUse { id, name, input } => {
                    self.blocks.insert(
                        *index,
                        PartialBlock::ToolUse {
                            id: id.clone(),
                            name: name.clone(),
                            initial_input: input.clone(),
                            json: String::new(),
                        },
                    );
                }
                ContentBlockStart::Other => {}
            },
            StreamEvent::ContentBlockDelta { index, delta } => {
                match (self.blocks.get_mut(index), delta) {
                    (Some(PartialBlock::Text(text)), ContentDelta::TextDelta { text: more }) => {
                        text.push_str(more);
                    }
                    (None, ContentDelta::TextDelta { text }) => {
                        // Some servers skip the block start for text
                        self.blocks.insert(*index, PartialBlock::Text(text.clone()));
                    }
                    (
                        Some(PartialBlock::ToolUse { json, .. }),
                        ContentDelta::InputJsonDelta { partial_json },
                    ) => {
                        json.push_str(partial_json);
                    }
                    _ => {
                        tracing::debug!("Ignoring delta for block {}", index);
                    }
                }
            }
            StreamEvent::ContentBlockStop { .. } | StreamEvent::Ping | StreamEvent::MessageStop => {}
            StreamEvent::MessageDelta { delta, usage } => {
                if delta.stop_reason.is_some() {
                    self.stop_reason = delta.stop_reason;
                }
                if let Some(usage) = usage {
                    self.usage.output_tokens = usage.output_tokens;
                }
            }
            StreamEvent::Error { error } => {
                return Err(BespokenError::Stream(format!("{}: {}", error.error_type, error.message)).into());
            }
        }
        Ok(())
    }

    /// Finish assembly, parsing any accumulated tool input JSON
    pub fn finish(self) -> Result<MessageResponse> {
        let mut content = Vec::with_capacity(self.blocks.len());
        for (_, block) in self.blocks {
            match block {
                PartialBlock::Text(text) => {
                    if !text.is_empty() {
                        content.push(ContentBlock::Text { text });
                    }
                }
                PartialBlock::ToolUse {
                    id,
                    name,
                    initial_input,
                    json,
                } => {
                    let input = if json.trim().is_empty() {
                        match initial_input {
                            Value::Null => Value::Object(Default::default()),
                            other => other,
                        }
                    } else {
                        serde_json::from_str(&json)
                            .with_context(|| format!("Invalid tool input JSON for {}: {}", name, json))?
                    };
                    content.push(ContentBlock::ToolUse { id, name, input });
                }
            }
        }

        Ok(MessageResponse {
            id: self.id,
            response_type: "message".to_string(),
            role: "assistant".to_string(),
            content,
            model: self.model,
            stop_reason: self.stop_reason,
            stop_sequence: None,
            usage: self.usage,
        })
    }
}

/// Replay a complete response as the event sequence a streaming server would send
pub fn events_from_response(response: &MessageResponse) -> Vec<StreamEvent> {
    use super::types::{MessageDeltaData, MessageStartData};

    let mut events = vec![StreamEvent::MessageStart {
        message: MessageStartData {
            id: response.id.clone(),
            model: response.model.clone(),
            usage: response.usage.clone(),
        },
    }];

    for (index, block) in response.content.iter().enumerate() {
        match block {
            ContentBlock::Text { text } => {
                events.push(StreamEvent::ContentBlockStart {
                    index,
                    content_block: ContentBlockStart::Text {
                        text: String::new(),
                    },
                });
                events.push(StreamEvent::ContentBlockDelta {
                    index,
                    delta: ContentDelta::TextDelta { text: text.clone() },
                });
            }
            ContentBlock::ToolUse { id, name, input } => {
                events.push(StreamEvent::ContentBlockStart {
                    index,
                    content_block: ContentBlockStart::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    },
                });
            }
            ContentBlock::ToolResult { .. } => continue,
        }
        events.push(StreamEvent::ContentBlockStop { index });
    }

    events.push(StreamEvent::MessageDelta {
        delta: MessageDeltaData {
            stop_reason: response.stop_reason,
            stop_sequence: None,
        },
        usage: None,
    });
    events.push(StreamEvent::MessageStop);
    events
}
