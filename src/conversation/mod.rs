//! In-memory conversation history
//!
//! Messages are kept in the Anthropic-compatible format from `llm::types`.

use uuid::Uuid;

pub use crate::llm::types::{ContentBlock, Message, MessageContent};

/// The running history of one chat session
#[derive(Debug, Clone)]
pub struct Conversation {
    id: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        tracing::debug!("Conversation {}: adding {} message", self.id, message.role);
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop everything after the first `len` messages
    pub fn rollback(&mut self, len: usize) {
        if len < self.messages.len() {
            tracing::info!(
                "Conversation {}: rolling back {} message(s)",
                self.id,
                self.messages.len() - len
            );
            self.messages.truncate(len);
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
