//! Chat endpoint request and response payloads.

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Inbound chat request. `chat_interest` marks a first-time interaction and
/// requires `interest_topic` to seed the new context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_id: String,
    pub user_message: String,
    pub chat_interest: bool,
    #[serde(default)]
    pub interest_topic: Option<String>,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.user_id.trim().is_empty() {
            return Err(ChatError::InvalidRequest("userId must not be empty".to_string()));
        }
        if self.user_message.trim().is_empty() {
            return Err(ChatError::InvalidRequest(
                "userMessage must not be empty".to_string(),
            ));
        }
        if self.chat_interest
            && self
                .interest_topic
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            return Err(ChatError::InvalidRequest(
                "interestTopic is required when chatInterest is true".to_string(),
            ));
        }
        Ok(())
    }
}

/// Assistant reply, Markdown-formatted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}
