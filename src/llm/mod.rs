//! LLM module - Multi-provider LLM client abstraction

mod anthropic;
mod client;
pub mod factory;
pub mod mock;
mod openai;
pub mod retry;

pub use anthropic::AnthropicClient;
pub use client::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, Message, Role, TokenUsage,
    ToolCall,
};
pub use openai::OpenAIClient;
