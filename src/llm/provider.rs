//! Provider abstraction and model-name resolution

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, Stream};
use std::pin::Pin;

use super::anthropic::AnthropicProvider;
use super::assembler::events_from_response;
use super::openai::OpenAiProvider;
use super::types::{ChatRequest, MessageResponse, StreamEvent};
use crate::error::BespokenError;

/// Stream of events from a streaming response
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// A hosted model the chat loop can talk to
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier sent to the API
    fn model(&self) -> &str;

    /// Short provider name for logs and errors
    fn provider_name(&self) -> &str;

    /// Send a request and wait for the complete response
    async fn send(&self, request: ChatRequest) -> Result<MessageResponse>;

    /// Send a request and receive the response as a stream of events
    ///
    /// The default implementation waits for the full response and replays it.
    async fn stream(&self, request: ChatRequest) -> Result<EventStream> {
        let response = self.send(request).await?;
        let events = events_from_response(&response);
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }
}

/// Which wire protocol a model name resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRoute {
    Anthropic(String),
    OpenAi(String),
}

/// Map a model name such as `anthropic/claude-3-5-sonnet-20240620` to a provider
pub fn route_model(model_name: &str) -> Result<ModelRoute, BespokenError> {
    let name = model_name.trim();
    if let Some((prefix, model)) = name.split_once('/') {
        if model.is_empty() {
            return Err(BespokenError::UnknownModel(model_name.to_string()));
        }
        return match prefix {
            "anthropic" => Ok(ModelRoute::Anthropic(model.to_string())),
            "openai" => Ok(ModelRoute::OpenAi(model.to_string())),
            _ => Err(BespokenError::UnknownModel(model_name.to_string())),
        };
    }

    if name.starts_with("claude") {
        Ok(ModelRoute::Anthropic(name.to_string()))
    } else if name.starts_with("gpt") || ["o1", "o3", "o4"].iter().any(|p| name.starts_with(p)) {
        Ok(ModelRoute::OpenAi(name.to_string()))
    } else {
        Err(BespokenError::UnknownModel(model_name.to_string()))
    }
}

/// Build a provider for a model name using credentials from the environment
pub fn provider_for_model(model_name: &str) -> Result<Box<dyn LlmProvider>> {
    let provider: Box<dyn LlmProvider> = match route_model(model_name)? {
        ModelRoute::Anthropic(model) => Box::new(AnthropicProvider::from_env(model)?),
        ModelRoute::OpenAi(model) => Box::new(OpenAiProvider::from_env(model)?),
    };
    tracing::info!(
        "Resolved model '{}' to {} provider",
        model_name,
        provider.provider_name()
    );
    Ok(provider)
}
