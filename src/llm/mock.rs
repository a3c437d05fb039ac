//! Deterministic mock LLM client for tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::ProviderError;

use super::{CompletionRequest, CompletionResponse, FinishReason, LlmClient, TokenUsage, ToolCall};

/// Deterministic step for scripted mock completions.
#[derive(Debug, Clone)]
pub enum MockStepKind {
    /// Return a plain assistant message.
    Text(String),
    /// Return a tool call response.
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    /// Return a provider error.
    Error(String),
}

#[derive(Debug, Clone)]
pub struct MockStep {
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: MockStepKind::Text(content.into()),
        }
    }

    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            kind: MockStepKind::ToolCall {
                id: id.into(),
                name: name.into(),
                arguments,
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: MockStepKind::Error(message.into()),
        }
    }
}

/// A deterministic mock LLM client driven by scripted steps.
///
/// Every request is captured so tests can assert on the prompts the caller
/// actually sent.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
    captured: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(steps.into())),
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn push_step(&self, step: MockStep) {
        self.script.lock().await.push_back(step);
    }

    /// Steps the script has not consumed yet.
    pub async fn remaining_steps(&self) -> usize {
        self.script.lock().await.len()
    }

    /// Requests received so far, oldest first.
    pub async fn captured_requests(&self) -> Vec<CompletionRequest> {
        self.captured.lock().await.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.captured.lock().await.push(request);

        let step = self.script.lock().await.pop_front().ok_or_else(|| {
            ProviderError::Other("mock script exhausted".to_string())
        })?;

        match step.kind {
            MockStepKind::Text(content) => Ok(CompletionResponse {
                content: Some(content),
                tool_calls: vec![],
                finish_reason: FinishReason::Stop,
                usage: Some(TokenUsage::default()),
            }),
            MockStepKind::ToolCall {
                id,
                name,
                arguments,
            } => Ok(CompletionResponse {
                content: None,
                tool_calls: vec![ToolCall {
                    id,
                    name,
                    arguments,
                }],
                finish_reason: FinishReason::ToolCalls,
                usage: Some(TokenUsage::default()),
            }),
            MockStepKind::Error(message) => Err(ProviderError::Other(message)),
        }
    }
}
