//! Chat agent: turns a prompt context into one assistant reply.
//!
//! The agent owns the provider client and the tool set. A turn is one
//! completion, at most one tool round, then the final text.

pub mod prompt;

use std::sync::Arc;

use serde_json::Value;

use crate::error::ProviderError;
use crate::llm::{CompletionRequest, LlmClient, Message as PromptMessage, ToolCall};
use crate::models::{Message, Role};
use crate::tools::{Tool, ToolOutput, ToolSchema};

const CHAT_TEMPERATURE: f32 = 0.7;

pub struct ChatAgent {
    llm: Arc<dyn LlmClient>,
    tools: Vec<Arc<dyn Tool>>,
}

impl ChatAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm, tools: vec![] }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|tool| tool.schema()).collect()
    }

    fn find_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// Generate one assistant reply for the given prompt context.
    ///
    /// Tool failures degrade to a textual notice in the follow-up prompt;
    /// only provider failures abort the turn.
    pub async fn generate(
        &self,
        system_prompt: &str,
        history: &[Message],
    ) -> Result<String, ProviderError> {
        let mut messages = vec![PromptMessage::system(system_prompt)];
        messages.extend(history.iter().map(to_prompt_message));

        let request = CompletionRequest::new(messages.clone())
            .with_tools(self.tool_schemas())
            .with_temperature(CHAT_TEMPERATURE);

        let response = self.llm.complete(request).await?;

        if response.tool_calls.is_empty() {
            return non_empty(response.content);
        }

        tracing::info!(
            tools = ?response.tool_calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "tool round requested"
        );

        // One tool round: run every requested call, feed the results back,
        // and ask for the final text without offering the tools again.
        messages.push(PromptMessage::assistant_with_tool_calls(
            response.content,
            response.tool_calls.clone(),
        ));
        for call in &response.tool_calls {
            let result_text = self.run_tool(call).await;
            messages.push(PromptMessage::tool_result(call.id.clone(), result_text));
        }

        let final_request =
            CompletionRequest::new(messages).with_temperature(CHAT_TEMPERATURE);
        let final_response = self.llm.complete(final_request).await?;
        non_empty(final_response.content)
    }

    async fn run_tool(&self, call: &ToolCall) -> String {
        let output = match self.find_tool(&call.name) {
            Some(tool) => tool
                .execute(call.arguments.clone())
                .await
                .unwrap_or_else(|err| ToolOutput::error(err.to_string())),
            None => ToolOutput::error(format!("unknown tool: {}", call.name)),
        };

        if output.success {
            render_tool_result(&output.result)
        } else {
            let message = output.error.unwrap_or_else(|| "tool failed".to_string());
            tracing::warn!(tool = %call.name, error = %message, "tool execution failed");
            format!("Tool {} failed: {}", call.name, message)
        }
    }
}

fn to_prompt_message(message: &Message) -> PromptMessage {
    match message.role {
        Role::User => PromptMessage::user(&message.content),
        Role::Assistant => PromptMessage::assistant(&message.content),
    }
}

fn render_tool_result(result: &Value) -> String {
    match result {
        Value::String(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn non_empty(content: Option<String>) -> Result<String, ProviderError> {
    content
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ProviderError::Other("provider returned an empty response".to_string()))
}
