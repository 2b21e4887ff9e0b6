pub mod anthropic;
pub mod assembler;
pub mod openai;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use assembler::{events_from_response, ResponseAssembler};
pub use openai::OpenAiProvider;
pub use provider::{provider_for_model, route_model, EventStream, LlmProvider, ModelRoute};
pub use types::{
    define_tool, ChatRequest, ContentBlock, Message, MessageContent, MessageResponse, StopReason,
    StreamEvent, ToolDefinition, ToolInputSchema, Usage,
};
