//! History compaction: folds the oldest chat turns into a running summary.

use crate::config::Settings;
use crate::error::ProviderError;
use crate::llm::{CompletionRequest, LlmClient, Message as PromptMessage};
use crate::models::{Message, Role, UserContext};

pub const SUMMARY_PROMPT: &str = include_str!("templates/summary_prompt.md");

/// Compaction configuration.
#[derive(Debug, Clone)]
pub struct CompactionConfig {
    /// Number of most recent messages kept verbatim after compaction.
    pub context_window: usize,
    /// Messages past the window tolerated before compaction fires.
    ///
    /// The slack means compaction runs once every `overlap` turns instead of
    /// on every turn after the window first fills.
    pub overlap: usize,
    /// Cap on the generated summary length.
    pub max_summary_tokens: u32,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            context_window: 10,
            overlap: 5,
            max_summary_tokens: 2_000,
        }
    }
}

impl CompactionConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            context_window: settings.context_window,
            overlap: settings.overlap_count,
            ..Self::default()
        }
    }

    fn threshold(&self) -> usize {
        self.context_window + self.overlap
    }
}

/// Keeps `chat_history` bounded by summarizing the oldest messages.
pub struct HistoryCompactor {
    config: CompactionConfig,
}

impl HistoryCompactor {
    pub fn new(config: CompactionConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(CompactionConfig::default())
    }

    /// Check if compaction is needed.
    pub fn needs_compaction(&self, context: &UserContext) -> bool {
        context.chat_history.len() > self.config.threshold()
    }

    /// Fold the oldest messages into the running summary once the history is
    /// `overlap` messages past the window.
    ///
    /// Summarizer failure is non-fatal: the context comes back untouched and
    /// the bound holds again after the next successful run. Losing messages
    /// or failing the turn would be worse than one oversized prompt.
    pub async fn maybe_compact(
        &self,
        context: UserContext,
        summarizer: &dyn LlmClient,
    ) -> UserContext {
        if !self.needs_compaction(&context) {
            return context;
        }

        let split_at = context.chat_history.len() - self.config.context_window;
        let to_summarize = &context.chat_history[..split_at];

        match self
            .summarize(to_summarize, &context.user_summary, summarizer)
            .await
        {
            Ok(summary) => {
                tracing::info!(
                    compacted = split_at,
                    remaining = self.config.context_window,
                    summary_length = summary.len(),
                    "chat history compacted"
                );
                let mut context = context;
                context.chat_history.drain(..split_at);
                context.user_summary = summary;
                context
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    history_len = context.chat_history.len(),
                    "summarization failed; keeping full history this turn"
                );
                context
            }
        }
    }

    async fn summarize(
        &self,
        messages: &[Message],
        prior_summary: &str,
        summarizer: &dyn LlmClient,
    ) -> Result<String, ProviderError> {
        let conversation = format_for_summary(messages);

        let prompt = if prior_summary.is_empty() {
            format!("Summarize this conversation:\n\n{conversation}")
        } else {
            format!(
                "Previous conversation summary:\n{prior_summary}\n\n\
                 New messages:\n{conversation}\n\n\
                 Merge the previous summary and the new messages into a single \
                 updated summary."
            )
        };

        let request = CompletionRequest::new(vec![
            PromptMessage::system(SUMMARY_PROMPT),
            PromptMessage::user(prompt),
        ])
        .with_max_tokens(self.config.max_summary_tokens);

        let response = summarizer.complete(request).await?;
        response
            .content
            .filter(|summary| !summary.trim().is_empty())
            .ok_or_else(|| ProviderError::Other("summarizer returned no content".to_string()))
    }
}

/// Format stored turns for the summarization prompt.
pub fn format_for_summary(messages: &[Message]) -> String {
    let mut output = String::new();
    for msg in messages {
        match msg.role {
            Role::User => output.push_str("User: "),
            Role::Assistant => output.push_str("Assistant: "),
        }
        output.push_str(&msg.content);
        output.push_str("\n\n");
    }
    output
}
